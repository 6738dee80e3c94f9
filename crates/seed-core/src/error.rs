use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt store at {}: {reason}", path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Invalid redaction rule: {0}")]
    InvalidRule(String),

    #[error("Invalid concept name: {0:?}")]
    InvalidConceptName(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(String),

    #[error("No concepts were successfully processed")]
    NothingStaged,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local ledger was written but the change never reached the remote.
    #[error("Ledger entry for {concept} was written locally but not propagated: {source}")]
    Diverged {
        concept: String,
        #[source]
        source: RemoteError,
    },

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Failures reported by version control or the remote content host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("`{op}` failed: {stderr}")]
    Command { op: String, stderr: String },

    #[error("HTTP {status} from {url}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("Stale write rejected for {path}: {detail}")]
    Conflict { path: String, detail: String },

    #[error("`{op}` timed out after {}s", after.as_secs())]
    Timeout { op: String, after: Duration },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Coarse error classes used when reporting failures to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Io,
    Remote,
    Consistency,
    Invalid,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::CorruptStore { .. }
            | Error::NothingStaged => ErrorKind::Io,
            Error::InvalidRule(_) | Error::InvalidConceptName(_) | Error::ConceptNotFound(_) => {
                ErrorKind::Invalid
            }
            Error::Remote(_) => ErrorKind::Remote,
            Error::Diverged { .. } => ErrorKind::Consistency,
            Error::Other(_) => ErrorKind::Internal,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Remote(RemoteError::Timeout { .. }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_is_consistency_error() {
        let err = Error::Diverged {
            concept: "Foo".to_string(),
            source: RemoteError::Command {
                op: "git push origin main".to_string(),
                stderr: "rejected".to_string(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.to_string().contains("Foo"));
    }

    #[test]
    fn test_timeout_classification() {
        let err: Error = RemoteError::Timeout {
            op: "git clone".to_string(),
            after: Duration::from_secs(5),
        }
        .into();
        assert!(err.is_timeout());
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.to_string(), "`git clone` timed out after 5s");
    }
}
