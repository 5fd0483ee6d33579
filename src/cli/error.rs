//! CLI-level errors (wraps hierarchy errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::HierarchyError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: HierarchyError,
    },

    #[error("{0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{failed} of {total} inputs failed the check")]
    CheckFailed { failed: usize, total: usize },

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Input { .. } | CliError::Hierarchy(_) => crate::exitcode::DATAERR,
            CliError::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    crate::exitcode::NOINPUT
                }
                _ => crate::exitcode::IOERR,
            },
            CliError::Config { .. } => crate::exitcode::CONFIG,
            CliError::CheckFailed { .. } => crate::exitcode::FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::Io {
            path: PathBuf::from("nope.tags"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(missing.exit_code(), crate::exitcode::NOINPUT);

        let bad = CliError::Input {
            path: PathBuf::from("x.tags"),
            source: HierarchyError::NonLaminarInput {
                first: "a".into(),
                second: "b".into(),
            },
        };
        assert_eq!(bad.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(bad.to_string(), "x.tags: non-laminar input: a partially overlaps b");
    }
}
