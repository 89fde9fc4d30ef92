//! Startup errors: configuration, key material and storage setup.

use std::borrow::Cow;
use std::error::Error as StdError;

use strum::{AsRefStr, Display, IntoStaticStr};

pub use seqvault_core::BoxedError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What part of the service setup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or contradictory settings, or an unparsable laboratories file.
    Config,
    /// Unusable signing or verification keys.
    Auth,
    /// A file could not be read.
    FileSystem,
    /// The object store client could not be created.
    Storage,
}

/// Failure while building [`ServiceState`].
///
/// [`ServiceState`]: crate::service::ServiceState
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn auth(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn file_system(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::FileSystem, message)
    }

    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn with_source(self, source: impl Into<BoxedError>) -> Self {
        Self {
            source: Some(source.into()),
            ..self
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<seqvault_core::Error> for Error {
    fn from(error: seqvault_core::Error) -> Self {
        use seqvault_core::ErrorKind as CoreErrorKind;

        let message = error.to_string();
        let converted = match error.kind() {
            CoreErrorKind::Configuration | CoreErrorKind::InvalidInput => Self::config(message),
            _ => Self::storage(message),
        };
        converted.with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_kind() {
        let error = Error::config("--laboratories-file is required");
        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.message(), "--laboratories-file is required");
        assert_eq!(error.to_string(), "config: --laboratories-file is required");
    }

    #[test]
    fn source_is_kept() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::file_system("cannot read laboratories file").with_source(source);

        assert!(StdError::source(&error).is_some());
        assert!(error.to_string().starts_with("file_system: "));
    }

    #[test]
    fn core_errors_convert() {
        let error: Error = seqvault_core::Error::configuration()
            .with_message("S3 access key ID and secret access key must be set together")
            .into();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(StdError::source(&error).is_some());

        let error: Error = seqvault_core::Error::external_error().into();
        assert_eq!(error.kind(), ErrorKind::Storage);
    }
}
