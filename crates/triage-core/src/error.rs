//! Error types for ticket-triage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using ticket-triage's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ticket-triage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Ticket does not exist upstream
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// HTTP/network request failed (transport error, timeout, non-2xx)
    #[error("Request error: {0}")]
    Request(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model output could not be turned into a valid structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration or credential error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error-kind tag carried on failed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Request,
    Inference,
    Parse,
    Config,
    Serialization,
    Io,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Request => "request",
            ErrorKind::Inference => "inference",
            ErrorKind::Parse => "parse",
            ErrorKind::Config => "config",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Io => "io",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The error-kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TicketNotFound(_) => ErrorKind::NotFound,
            Error::Request(_) => ErrorKind::Request,
            Error::Inference(_) => ErrorKind::Inference,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Config(_) => ErrorKind::Config,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the remote-call layer may retry the operation that produced
    /// this error.
    ///
    /// Only transient remote failures qualify. A missing ticket is terminal on
    /// the first response and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Inference(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Request(format!("request timed out: {}", e))
        } else {
            Error::Request(e.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
