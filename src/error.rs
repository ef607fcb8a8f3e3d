//! Typed error hierarchies for the three core subsystems.
//!
//! Parsing and policy failures recovered into HTTP responses live in
//! [`ParseError`]; failures that must abort application startup (bad route
//! registration) live in [`RegistrationError`]; transport-level I/O failures
//! live in [`TransportError`]. None of these are ever turned into a string
//! and thrown away -- callers can match on the variant.

use std::fmt;

use crate::status::StatusCode;

/// A failure recovered by the messenger into an HTTP error response.
///
/// Every variant carries the status code the messenger must emit for it, via
/// [`ParseError::status`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The request-line or a header line did not match the HTTP/1.x grammar.
    #[error("malformed request: {0}")]
    Malformed(&'static str),

    /// The header section exceeded the configured byte ceiling before the
    /// terminating blank line was found.
    #[error("request header fields too large")]
    HeadersTooLarge,

    /// More than one `Content-Length` header was present.
    #[error("conflicting Content-Length headers")]
    ConflictingContentLength,

    /// `Content-Length` was present but not a valid non-negative integer.
    #[error("invalid Content-Length")]
    InvalidContentLength,

    /// `Transfer-Encoding` was present without a usable `Content-Length`.
    #[error("unsupported transfer-encoding")]
    UnsupportedTransferEncoding,

    /// The declared body size exceeded the configured ceiling.
    #[error("request body too large")]
    BodyTooLarge,

    /// No bytes arrived within the configured read timeout.
    #[error("request timed out")]
    Timeout,
}

impl ParseError {
    /// The status code the messenger must emit for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::Malformed(_) => StatusCode::BAD_REQUEST,
            ParseError::HeadersTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            ParseError::ConflictingContentLength => StatusCode::BAD_REQUEST,
            ParseError::InvalidContentLength => StatusCode::BAD_REQUEST,
            ParseError::UnsupportedTransferEncoding => StatusCode::NOT_IMPLEMENTED,
            ParseError::BodyTooLarge => StatusCode::CONTENT_TOO_LARGE,
            ParseError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

/// A failure while building a [`crate::router::tree::Tree`] or registering a
/// route with the [`crate::router::Router`]. These never reach an HTTP
/// client; they are meant to abort application startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum RegistrationError {
    /// Two routes resolved to the same terminal node.
    #[error("duplicate route for pattern `{0}`")]
    DuplicateRoute(String),

    /// A tail wildcard was inserted at a node that already has one, or a
    /// non-wildcard route was inserted at a node already holding a tail
    /// wildcard.
    #[error("ambiguous wildcard for pattern `{0}`")]
    AmbiguousWildcard(String),

    /// Two sibling routes declared differently-named placeholders at the
    /// same tree position.
    #[error("placeholder name conflict for pattern `{0}`: `{1}` vs `{2}`")]
    PlaceholderConflict(String, String, String),
}

/// A failure reading from or writing to a [`crate::transport::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying I/O operation failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was closed by the peer mid-operation.
    #[error("transport closed")]
    Closed,
}

/// The outcome of invoking a user handler or middleware: either a finished
/// response or an opaque failure that the messenger turns into a `500`.
///
/// Modelled as a `Result` at the messenger boundary rather than letting a
/// handler panic unwind through the state machine; see
/// [`crate::messenger::Messenger`].
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Wraps an arbitrary handler failure, capturing only a display string.
    /// The messenger logs the original value and never exposes it to
    /// clients.
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler error: {}", self.message)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for HandlerError {}
