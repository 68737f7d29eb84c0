//! Internal fault types.
//!
//! Failures a model can act on (missing file, ambiguous edit, non-zero exit)
//! are returned as [`ToolResult`](crate::tools::types::ToolResult) values, not
//! errors. [`ToolError`] covers faults a tool cannot meaningfully describe to
//! the model itself; the registry converts them into error results at the
//! execution boundary.

use std::path::PathBuf;
use thiserror::Error;

/// A fault raised while executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::InvalidArguments(e.to_string())
    }
}

/// A failure loading or validating [`AgentConfig`](crate::config::AgentConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_path() {
        let err = ToolError::io(
            "/tmp/x.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x.txt"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn serde_error_becomes_invalid_arguments() {
        let parse: Result<u32, _> = serde_json::from_str("\"nope\"");
        let err: ToolError = parse.unwrap_err().into();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
