//! Harness error types
use std::path::PathBuf;
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised while declaring cases or driving test executables.
///
/// Assertion failures, faults and timeouts inside a case are not errors at
/// this level: the runner records them as case outcomes.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Test case '{group}.{case}' is already declared")]
    DuplicateCase { group: String, case: String },

    #[error("Test group '{0}' was never declared")]
    UnknownGroup(String),

    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("Failed to start {}: {error}", .command.display())]
    Spawn {
        command: PathBuf,
        error: std::io::Error,
    },

    #[error("Listing tests of {} failed ({status}): {stderr}", .command.display())]
    ListFailed {
        command: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Create a duplicate case error
    pub fn duplicate_case(group: impl Into<String>, case: impl Into<String>) -> Self {
        Self::DuplicateCase {
            group: group.into(),
            case: case.into(),
        }
    }

    /// Create a spawn error with command context
    pub fn spawn(command: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            error,
        }
    }

    /// Whether this error was raised at declaration time
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCase { .. } | Self::UnknownGroup(_) | Self::InvalidName { .. }
        )
    }
}
