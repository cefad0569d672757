//! Error taxonomy shared by every component.
//!
//! Network- and remote-level failures are returned as values, never panics.
//! Nothing in this crate retries; retry policy belongs to the caller.

use thiserror::Error;

use crate::staging::StagedKey;

/// Errors produced by cursor, reconciler, staging, and backend operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent or its response could not be received.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status, or with a body that is
    /// not structured data.
    #[error("backend returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// A pagination operation was invoked in a state that does not allow it.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A required field is empty or an id is missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A positional staging operation addressed a slot past the end.
    #[error("index {index} out of range for {len} staged item(s)")]
    Index { index: usize, len: usize },

    /// A key-addressed staging operation named an item that is not staged.
    #[error("no staged item with key {0}")]
    UnknownKey(StagedKey),

    /// The mutation was applied by the backend, but the reload that follows
    /// it failed. Local state is stale until the next successful reset.
    #[error("mutation applied but reload failed: {0}")]
    Reload(#[source] Box<Error>),
}

impl Error {
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Error::Remote {
            status,
            body: body.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// HTTP status carried by a remote error, looking through a failed reload.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            Error::Reload(inner) => inner.status(),
            _ => None,
        }
    }

    /// True when the failure happened at the transport level.
    pub fn is_network(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Reload(inner) => inner.is_network(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_looks_through_reload() {
        let err = Error::Reload(Box::new(Error::remote(503, "busy")));
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_network());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = Error::remote(404, "{\"error\":\"not found\"}");
        assert_eq!(
            err.to_string(),
            "backend returned 404: {\"error\":\"not found\"}"
        );
    }
}
