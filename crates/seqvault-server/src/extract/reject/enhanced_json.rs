//! JSON extractor that also accepts base64-encoded bodies.
//!
//! Gateways in front of the service may forward the request body base64
//! encoded. [`Json`] decodes such bodies before deserializing, and does not
//! insist on a `Content-Type` header since encoded bodies rarely carry one.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{FromRequest, Json as AxumJson, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::handler::{Error, ErrorKind};

/// Tracing target for request body decoding.
const TRACING_TARGET: &str = "seqvault_server::extract::json";

/// JSON body extractor and response.
///
/// Bodies that do not start like a JSON document are base64-decoded first.
/// Rejections carry a short `bad_request` message.
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
#[must_use]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Returns the JSON text of a body that may be base64 encoded.
fn decode_body(body: Bytes) -> Result<Bytes, Error<'static>> {
    let trimmed = body.trim_ascii();
    if trimmed.starts_with(b"{") || trimmed.starts_with(b"[") || trimmed.is_empty() {
        return Ok(body);
    }

    let decoded = STANDARD.decode(trimmed).map_err(|err| {
        tracing::debug!(
            target: TRACING_TARGET,
            error = %err,
            "Request body is neither JSON nor base64"
        );

        ErrorKind::BadRequest
            .with_message("Request body must be JSON or base64-encoded JSON")
            .with_context(format!("base64 decoding failed: {}", err))
    })?;

    tracing::trace!(
        target: TRACING_TARGET,
        encoded = body.len(),
        decoded = decoded.len(),
        "Decoded base64 request body"
    );

    Ok(Bytes::from(decoded))
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await?;
        let body = decode_body(body)?;

        let AxumJson(value) = AxumJson::<T>::from_bytes(&body)?;
        Ok(Self(value))
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<BytesRejection> for Error<'static> {
    fn from(rejection: BytesRejection) -> Self {
        let status = rejection.status();
        let detail = shorten(&rejection.body_text());

        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Request body is too large"
        } else {
            "Request body could not be read"
        };
        ErrorKind::BadRequest.with_message(message).with_context(detail)
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "Request body does not match the expected shape",
            JsonRejection::MissingJsonContentType(_) => "Expected an application/json body",
            JsonRejection::BytesRejection(_) => "Request body could not be read",
            _ => {
                return ErrorKind::InternalServerError
                    .with_context(format!("unhandled JSON rejection: {rejection:?}"));
            }
        };

        ErrorKind::BadRequest
            .with_message(message)
            .with_context(shorten(&rejection.body_text()))
    }
}

/// First lines of a rejection text, capped for logging.
fn shorten(text: &str) -> String {
    const MAX_CHARS: usize = 200;

    let joined = text.lines().take(3).collect::<Vec<_>>().join(" ");
    joined.chars().take(MAX_CHARS).collect()
}

impl<T> aide::OperationInput for Json<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        AxumJson::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_early_responses(ctx, operation)
    }
}

impl<T> aide::OperationOutput for Json<T>
where
    T: schemars::JsonSchema + Serialize,
{
    type Inner = T;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        AxumJson::<T>::operation_response(ctx, operation)
    }

    fn inferred_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AxumJson::<T>::inferred_responses(ctx, operation)
    }
}
