//! Error types for the parameter model
//!
//! Expected domain failures (bad paths, wrong value kinds, length budgets,
//! authorization denials) are reported as [`Error`] values carrying a
//! [`StatusCode`]. Transport layers translate the code directly into their
//! own status representation.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for parameter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Status codes reported to clients
///
/// Numbering follows the gRPC canonical codes so that transports can forward
/// them without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Success
    Ok = 0,
    /// Operation was cancelled
    Cancelled = 1,
    /// Unknown error
    Unknown = 2,
    /// Malformed path token, wrong value kind, unsupported index
    InvalidArgument = 3,
    /// Deadline expired
    DeadlineExceeded = 4,
    /// Unknown param, field, alternative or sub-path
    NotFound = 5,
    /// Entity already exists
    AlreadyExists = 6,
    /// Authorization denied at some node
    PermissionDenied = 7,
    /// Resource exhausted
    ResourceExhausted = 8,
    /// Precondition failed
    FailedPrecondition = 9,
    /// Operation aborted
    Aborted = 10,
    /// Index out of bounds or length budget exceeded
    OutOfRange = 11,
    /// Operation not implemented
    Unimplemented = 12,
    /// Internal invariant violated
    Internal = 13,
    /// Service unavailable
    Unavailable = 14,
    /// Unrecoverable data loss
    DataLoss = 15,
    /// Missing or invalid credentials
    Unauthenticated = 16,
}

impl StatusCode {
    /// Canonical upper-case name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Aborted => "ABORTED",
            StatusCode::OutOfRange => "OUT_OF_RANGE",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::DataLoss => "DATA_LOSS",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for the parameter model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed request: bad path token, wrong value kind, unexpected index
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Index out of bounds or a length budget exceeded
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Unknown param, field, alternative or sub-path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authorizer denied access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Credentials could not be decoded
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Operation exists in the protocol but not here
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Programming error, e.g. descriptor and value out of step
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create an `OutOfRange` error
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }

    /// Create a `NotFound` error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a `PermissionDenied` error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Error::PermissionDenied(msg.into())
    }

    /// Create an `Unauthenticated` error
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Error::Unauthenticated(msg.into())
    }

    /// Create an `Unimplemented` error
    pub fn unimplemented(msg: impl Into<String>) -> Self {
        Error::Unimplemented(msg.into())
    }

    /// Create an `Internal` error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Status code carried by this error
    pub fn code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::InvalidArgument,
            Error::OutOfRange(_) => StatusCode::OutOfRange,
            Error::NotFound(_) => StatusCode::NotFound,
            Error::PermissionDenied(_) => StatusCode::PermissionDenied,
            Error::Unauthenticated(_) => StatusCode::Unauthenticated,
            Error::Unimplemented(_) => StatusCode::Unimplemented,
            Error::Internal(_) => StatusCode::Internal,
        }
    }

    /// Message without the status prefix
    pub fn message(&self) -> &str {
        match self {
            Error::InvalidArgument(m)
            | Error::OutOfRange(m)
            | Error::NotFound(m)
            | Error::PermissionDenied(m)
            | Error::Unauthenticated(m)
            | Error::Unimplemented(m)
            | Error::Internal(m) => m,
        }
    }
}
