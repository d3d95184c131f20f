//! Error type shared by every reader.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// A structural read failed: the proc root, an existing fd directory,
    /// or the kernel TCP table.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed stat for pid {pid}: {reason}")]
    MalformedStat { pid: i32, reason: String },

    #[error("failed to run {command}: {source}")]
    CommandSpawn {
        command: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: &'static str,
        status: String,
        stderr: String,
    },

    #[error("unparseable {tool} output ({reason}): {line:?}")]
    Parse {
        tool: &'static str,
        line: String,
        reason: String,
    },

    #[error("invalid comm filter: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("PID {0} not found")]
    PidNotFound(i32),

    #[error("process scanning is not supported on {0}")]
    Unsupported(&'static str),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(tool: &'static str, line: &str, reason: impl Into<String>) -> Self {
        ScanError::Parse {
            tool,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_not_found_message() {
        assert_eq!(ScanError::PidNotFound(42).to_string(), "PID 42 not found");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = ScanError::io("/proc/12/fd", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.to_string().starts_with("I/O error at /proc/12/fd"));
    }
}
