//! Handler error with a fixed set of kinds and optional detail.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// A specialized [`Result`] type for handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Failure returned by handlers and extractors.
///
/// The [`ErrorKind`] picks the status code and the body's `name`. A message
/// is appended to the kind's default text, and a resource names what the
/// request was about. `context` is written to the log only.
#[derive(Clone)]
#[must_use = "errors do nothing unless turned into a response"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates an error of the given kind without any detail.
    #[inline]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            resource: None,
            context: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Adds a message shown to the caller.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Names the resource the failure relates to.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Adds detail that is only logged.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Builds the response body for this error.
    pub fn to_body(&self) -> ErrorResponse<'_> {
        let mut body = ErrorResponse::from(self.kind);
        if let Some(message) = self.message.as_deref() {
            body = body.with_message(message);
        }
        if let Some(resource) = self.resource.as_deref() {
            body = body.with_resource(resource);
        }
        if let Some(context) = self.context.as_deref() {
            body = body.with_context(context);
        }
        body
    }
}

impl Default for Error<'static> {
    fn default() -> Self {
        Self::new(ErrorKind::InternalServerError)
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("status", &self.kind.status_code().as_u16())
            .field("message", &self.message)
            .field("resource", &self.resource)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.status_code().as_u16(), self.kind)?;
        if let Some(resource) = self.resource.as_deref() {
            write!(f, " on {resource}")?;
        }
        if let Some(message) = self.message.as_deref() {
            write!(f, ": {message}")?;
        }
        if let Some(context) = self.context.as_deref() {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        self.to_body().into_response()
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse<'static>;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        axum::Json::<ErrorResponse<'static>>::operation_response(ctx, operation)
    }
}

/// Category of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum ErrorKind {
    /// The body failed to parse or validate.
    BadRequest,
    /// No `Authorization` header.
    MissingAuthToken,
    /// The header or token could not be decoded.
    MalformedAuthToken,
    /// Signature, issuer, audience or expiry rejected.
    Unauthorized,
    /// The caller may not read the laboratory.
    Forbidden,
    /// No route matched.
    NotFound,
    InternalServerError,
}

impl ErrorKind {
    /// Wraps the kind in an [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Machine-readable name written to the `name` field of the body.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::MissingAuthToken => "missing_auth_token",
            Self::MalformedAuthToken => "malformed_auth_token",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InternalServerError => "internal_server_error",
        }
    }

    /// Text used for the `message` field when nothing more specific is known.
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The listing request is not valid.",
            Self::MissingAuthToken => "A bearer token is required.",
            Self::MalformedAuthToken => "The bearer token could not be read.",
            Self::Unauthorized => "The bearer token was rejected.",
            Self::Forbidden => "Access to this laboratory is denied.",
            Self::NotFound => "Nothing is served at this path.",
            Self::InternalServerError => "Internal server error.",
        }
    }

    /// Hint sent along with the body, if the kind has one.
    pub const fn suggestion(self) -> Option<&'static str> {
        match self {
            Self::MissingAuthToken => Some("Send an 'Authorization: Bearer <token>' header"),
            Self::Unauthorized => Some("Request a new token and retry"),
            _ => None,
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::MissingAuthToken | Self::MalformedAuthToken | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}
