//! Error type shared by the storage, server and explorer crates.

use std::borrow::Cow;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Any thread-safe error, kept as the source of an [`Error`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong, independent of the layer that noticed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A request or document failed validation.
    InvalidInput,
    /// The listing service could not be reached.
    NetworkError,
    /// The caller's token was rejected.
    Authentication,
    /// The caller may not read the laboratory.
    Authorization,
    InternalError,
    /// The object store answered with an error.
    ExternalError,
    Configuration,
    /// Laboratory or object is unknown.
    NotFound,
    /// A body could not be encoded or decoded.
    Serialization,
}

impl ErrorKind {
    /// Returns `true` for failures that may go away when the call is repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ExternalError)
    }
}

/// An [`ErrorKind`] with optional message, source and context.
///
/// Displays as `[kind]` or `[kind]: message`.
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
#[must_use]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<Cow<'static, str>>,
    /// Detail that is logged but not shown to callers.
    pub context: Option<Cow<'static, str>>,
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
            source: None,
        }
    }

    /// Wraps `source` as the cause of a new error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self::new(kind).with_source(source)
    }

    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    pub fn with_context(self, context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    pub fn with_source(self, source: impl Into<BoxedError>) -> Self {
        Self {
            source: Some(source.into()),
            ..self
        }
    }

    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    pub fn authorization() -> Self {
        Self::new(ErrorKind::Authorization)
    }

    pub fn external_error() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(ErrorKind::InternalError, error).with_message("I/O operation failed")
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("Invalid JSON document")
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::from_source(ErrorKind::InvalidInput, errors).with_message("Validation failed")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn builder_sets_fields() {
        let error = Error::configuration()
            .with_message("S3 region is missing")
            .with_context("--s3-region");

        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(error.message.as_deref(), Some("S3 region is missing"));
        assert_eq!(error.context.as_deref(), Some("--s3-region"));
        assert!(error.source.is_none());
    }

    #[test]
    fn display_with_and_without_message() {
        let error = Error::not_found().with_message("laboratory LAB-1");
        assert_eq!(error.to_string(), "[not_found]: laboratory LAB-1");

        assert_eq!(Error::internal_error().to_string(), "[internal_error]");
    }

    #[test]
    fn io_error_is_kept_as_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        assert_eq!(error.kind, ErrorKind::InternalError);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn json_error_is_serialization() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json_error).kind, ErrorKind::Serialization);
    }

    #[test]
    fn only_transport_failures_retry() {
        assert!(Error::external_error().is_retryable());
        assert!(Error::new(ErrorKind::NetworkError).is_retryable());
        assert!(!Error::invalid_input().is_retryable());
        assert!(!Error::authorization().is_retryable());
    }

    #[test]
    fn kind_parses_snake_case() {
        assert_eq!(
            ErrorKind::from_str("invalid_input").unwrap(),
            ErrorKind::InvalidInput
        );
        assert_eq!(ErrorKind::from_str("not_found").unwrap(), ErrorKind::NotFound);
        assert!(ErrorKind::from_str("bogus").is_err());
    }
}
