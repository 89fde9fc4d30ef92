//! JSON body extractor that also runs `validator` rules.

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// Tracing target for request validation.
const TRACING_TARGET: &str = "seqvault_server::extract::validate";

/// A deserialized body whose [`Validate`] rules all passed.
///
/// Rejects with `bad_request`, listing every failed rule in the message.
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
#[must_use]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

/// Spells a Rust field name the way request bodies do (`laboratory_id` as
/// `LaboratoryId`).
fn wire_name(field: &str) -> String {
    field
        .split('_')
        .flat_map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase())
                .into_iter()
                .chain(chars)
        })
        .collect()
}

/// Describes one failed rule as a sentence naming the body field.
fn describe(field: &str, error: &ValidationError) -> String {
    let field = wire_name(field);
    if let Some(message) = error.message.as_deref() {
        return format!("{field}: {message}");
    }

    let bound = |name: &str| error.params.get(name).and_then(serde_json::Value::as_f64);
    let unit = if error.code == "length" { " characters" } else { "" };

    match (error.code.as_ref(), bound("min"), bound("max")) {
        ("length", Some(min), None) if min <= 1.0 => format!("{field} must not be empty"),
        ("length" | "range", Some(min), Some(max)) => {
            format!("{field} must be between {min} and {max}{unit}")
        }
        ("length" | "range", Some(min), None) => format!("{field} must be at least {min}{unit}"),
        ("length" | "range", None, Some(max)) => format!("{field} must be at most {max}{unit}"),
        ("required", ..) => format!("{field} is required"),
        (code, ..) => format!("{field} is invalid ({code})"),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();

        let mut sentences: Vec<String> = field_errors
            .iter()
            .flat_map(|(field, rules)| rules.iter().map(move |rule| describe(field, rule)))
            .collect();
        sentences.sort_unstable();

        tracing::warn!(
            target: TRACING_TARGET,
            fields = ?field_errors.keys().collect::<Vec<_>>(),
            "Request body failed validation"
        );

        let error = ErrorKind::BadRequest.with_resource("request");
        if sentences.is_empty() {
            error
        } else {
            error.with_message(sentences.join(". "))
        }
    }
}

impl<T> aide::OperationInput for ValidateJson<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        Json::<T>::inferred_early_responses(ctx, operation)
    }
}
