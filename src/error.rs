//! Error types that are exposed by this library.
//!
//! Internally, functions return `anyhow` results (`Res<T>`) and attach context as they go. At the
//! boundary of a public operation the `anyhow::Error` is classified with an `ErrorType` using
//! `IntoResult::pub_result`, so callers can tell a rejected input from a failed request.

use std::fmt::{Debug, Display, Formatter};
use tracing::{error, warn};

/// The result type used internally, where errors are only enriched with context.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The result type returned by public operations of this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The input was rejected locally and nothing was sent over the network. For example: no file
    /// selected, an empty chat message, or a view that requires data before any was uploaded.
    Validation,
    /// The request could not be completed: network failure, timeout or a non-2xx status.
    Transport,
    /// The server answered with a body that does not have the expected shape.
    Protocol,
    /// The configuration directory or file is missing or invalid.
    Config,
    /// A local file could not be read or written.
    Io,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Validation => "validation",
            ErrorType::Transport => "transport",
            ErrorType::Protocol => "protocol",
            ErrorType::Config => "config",
            ErrorType::Io => "io",
        };
        f.write_str(s)
    }
}

/// The public error type of this library.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    /// Create a new error of `error_type` wrapping `inner`.
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Create a `Validation` error with the given message.
    pub fn validation<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(ErrorType::Validation, anyhow::Error::msg(message))
    }

    /// Create a `Transport` error with the given message.
    pub fn transport<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(ErrorType::Transport, anyhow::Error::msg(message))
    }

    /// Create a `Protocol` error with the given message.
    pub fn protocol<M>(message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(ErrorType::Protocol, anyhow::Error::msg(message))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_validation(&self) -> bool {
        self.error_type == ErrorType::Validation
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.inner)
        } else {
            Display::fmt(&self.inner, f)
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into a public `Result` by classifying its error.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

/// Logs a failed request. Protocol errors are logged at `error` so that a misbehaving server can
/// be told apart from a flaky network, which is only a `warn`.
pub(crate) fn log_failure(operation: &str, e: &Error) {
    match e.error_type() {
        ErrorType::Protocol => error!("{operation} failed with an unexpected response: {e:#}"),
        other => warn!("{operation} failed ({other}): {e:#}"),
    }
}
