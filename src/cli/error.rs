//! CLI-level errors (wraps library errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::{FormatError, GenerateError, GraphError, PartitionError, RationalError, SettingsError};
use crate::exitcode;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{path}: {source}")]
    Input { path: PathBuf, source: FormatError },

    #[error("{0}")]
    Format(#[from] FormatError),

    #[error("{0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{0}")]
    Partition(#[from] PartitionError),

    #[error("{0}")]
    Rational(#[from] RationalError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Runtime(String),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Rational(_) => exitcode::USAGE,
            CliError::Generate(
                GenerateError::InvalidParameter(_) | GenerateError::Graph(GraphError::TooManyNodes { .. }),
            ) => exitcode::USAGE,
            CliError::Partition(PartitionError::InvalidPartCount(_) | PartitionError::InvalidImbalance(_)) => {
                exitcode::USAGE
            }
            CliError::Input { source, .. } | CliError::Format(source) => match source {
                FormatError::Io(_) => exitcode::IOERR,
                _ => exitcode::DATAERR,
            },
            CliError::Graph(_) | CliError::Partition(_) => exitcode::DATAERR,
            CliError::Open { .. } => exitcode::NOINPUT,
            CliError::Io(_) => exitcode::IOERR,
            CliError::Settings(_) => exitcode::CONFIG,
            CliError::Generate(_) | CliError::Runtime(_) => exitcode::SOFTWARE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
        assert_eq!(
            CliError::Format(FormatError::malformed(3, "bad")).exit_code(),
            exitcode::DATAERR
        );
        assert_eq!(
            CliError::Partition(PartitionError::InvalidPartCount(0)).exit_code(),
            exitcode::USAGE
        );
        assert_eq!(
            CliError::Partition(PartitionError::Infeasible { part_cnt: 2 }).exit_code(),
            exitcode::DATAERR
        );
        assert_eq!(
            CliError::Partition(PartitionError::Graph(GraphError::WeightOverflow)).exit_code(),
            exitcode::DATAERR
        );
        assert_eq!(
            CliError::Generate(GenerateError::Graph(GraphError::TooManyNodes {
                node_count: usize::MAX,
                limit: 1
            }))
            .exit_code(),
            exitcode::USAGE
        );
        assert_eq!(
            CliError::Settings(SettingsError::Environment("x".into())).exit_code(),
            exitcode::CONFIG
        );
        let open = CliError::Open {
            path: PathBuf::from("missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(open.exit_code(), exitcode::NOINPUT);
    }

    #[test]
    fn test_input_error_names_file() {
        let err = CliError::Input {
            path: PathBuf::from("g.metis"),
            source: FormatError::malformed(2, "missing weight"),
        };
        assert_eq!(err.to_string(), "g.metis: line 2: missing weight");
    }
}
