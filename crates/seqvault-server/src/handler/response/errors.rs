use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schemars::JsonSchema;
use serde::Serialize;

use crate::handler::ErrorKind;

/// Tracing target for error responses.
const TRACING_TARGET: &str = "seqvault_server::handler::response";

/// JSON body sent for every failed request.
///
/// `context` and `status` are kept out of the serialized body.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct ErrorResponse<'a> {
    /// Stable identifier of the failure, e.g. `forbidden`.
    pub name: Cow<'a, str>,
    /// Text that is safe to show to the caller.
    pub message: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Cow<'a, str>>,

    #[serde(skip)]
    pub context: Option<Cow<'a, str>>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    /// Appends a sentence to the message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        let extra = message.into();
        let base = self.message.trim_end_matches('.');
        self.message = Cow::Owned(format!("{base}. {extra}"));
        self
    }

    /// Sets the resource, nesting under an existing one with `/`.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        let resource = resource.into();
        self.resource = Some(match self.resource.take() {
            Some(parent) => Cow::Owned(format!("{parent}/{resource}")),
            None => resource,
        });
        self
    }

    /// Adds log-only context, separated from earlier context with `; `.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let context = context.into();
        self.context = Some(match self.context.take() {
            Some(earlier) => Cow::Owned(format!("{earlier}; {context}")),
            None => context,
        });
        self
    }
}

impl From<ErrorKind> for ErrorResponse<'static> {
    fn from(kind: ErrorKind) -> Self {
        Self {
            name: Cow::Borrowed(kind.name()),
            message: Cow::Borrowed(kind.default_message()),
            resource: None,
            suggestion: kind.suggestion().map(Cow::Borrowed),
            context: None,
            status: kind.status_code(),
        }
    }
}

impl Default for ErrorResponse<'static> {
    fn default() -> Self {
        Self::from(ErrorKind::InternalServerError)
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                status = self.status.as_u16(),
                name = %self.name,
                context = ?self.context,
                "Request failed"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET,
                status = self.status.as_u16(),
                name = %self.name,
                message = %self.message,
                resource = ?self.resource,
                context = ?self.context,
                "Request rejected"
            );
        }

        (self.status, Json(self)).into_response()
    }
}
