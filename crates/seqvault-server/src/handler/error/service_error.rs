//! Storage and service error to HTTP error conversions.
//!
//! Only invalid input and authorization failures keep their meaning at the
//! HTTP boundary. Everything else collapses into an opaque 500 whose details
//! are logged but never sent to the client.

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for service error conversions.
const TRACING_TARGET: &str = "seqvault_server::handler::service";

impl From<seqvault_core::Error> for HttpError<'static> {
    fn from(error: seqvault_core::Error) -> Self {
        use seqvault_core::ErrorKind as CoreErrorKind;

        match error.kind() {
            CoreErrorKind::InvalidInput | CoreErrorKind::Authentication => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "Request rejected"
                );
            }
            CoreErrorKind::Authorization => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Authorization failed"
                );
            }
            CoreErrorKind::NetworkError | CoreErrorKind::ExternalError => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    source = ?std::error::Error::source(&error),
                    "Object store request failed"
                );
            }
            _ => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "Service operation failed"
                );
            }
        }

        let context = match error.context.as_deref() {
            Some(context) => format!("{error} ({context})"),
            None => error.to_string(),
        };
        match error.kind() {
            CoreErrorKind::InvalidInput => {
                let message = error.message.as_deref().unwrap_or("Invalid input").to_owned();
                ErrorKind::BadRequest
                    .with_message(message)
                    .with_context(context)
            }
            CoreErrorKind::Authentication => ErrorKind::Unauthorized.with_context(context),
            CoreErrorKind::Authorization => ErrorKind::Forbidden.with_context(context),
            _ => ErrorKind::InternalServerError.with_context(context),
        }
    }
}

impl From<crate::Error> for HttpError<'static> {
    fn from(error: crate::Error) -> Self {
        tracing::error!(
            target: TRACING_TARGET,
            error = %error,
            error_kind = %error.kind(),
            "Service error"
        );

        ErrorKind::InternalServerError.with_context(error.to_string())
    }
}
