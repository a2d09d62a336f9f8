use std::fmt;

use thiserror::Error;

/// Failure reported by the backend collaborator, as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The payload parsed but carried an `error` field.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Remote, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus(u16),
    InvalidResponse,
    TooLarge { max_bytes: u64 },
    Remote,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes } => {
                write!(f, "response too large (max {max_bytes})")
            }
            FailureKind::Remote => write!(f, "remote error"),
        }
    }
}
