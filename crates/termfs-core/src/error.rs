//! Error types for the file system and the shell.
//!
//! - [`FsError`] - path and structural failures of the file system engine
//! - [`ShellError`] - command dispatch and argument failures
//! - [`EnvironmentError`] - variable table updates
//! - [`StorageError`] - backing store failures
//! - [`InvariantViolation`] - internal corruption of the node arena

use thiserror::Error;

/// File system engine errors.
///
/// Each variant carries the path (or name) it refers to, so the shell can
/// render the exact message its command prints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("{0}: No such file or directory")]
    NotFound(String),
    #[error("{0}: Not a directory")]
    NotADirectory(String),
    #[error("{0}: Is a directory")]
    IsADirectory(String),
    #[error("{0}: parent directory not found")]
    ParentNotFound(String),
    #[error("{0}: parent is not a directory")]
    ParentNotDirectory(String),
    #[error("{0}: File exists")]
    NameExists(String),
    #[error("cannot move '{from}' into itself, '{to}'")]
    CannotMoveIntoSelf { from: String, to: String },
    #[error("cannot delete the root directory")]
    CannotDeleteRoot,
    #[error("{0}: Directory not empty")]
    DirectoryNotEmpty(String),
    #[error("{0}: source not found")]
    SourceNotFound(String),
    #[error("{0}: destination not found")]
    DestinationNotFound(String),
    #[error("{0}: destination is not a directory")]
    DestinationNotDirectory(String),
    #[error("invalid name: '{0}'")]
    InvalidName(String),
}

impl FsError {
    /// Short POSIX-style reason, without the path.
    ///
    /// Used when a command formats its own message around the operand,
    /// e.g. `ls: cannot access 'x': No such file or directory`.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_)
            | Self::ParentNotFound(_)
            | Self::SourceNotFound(_)
            | Self::DestinationNotFound(_) => "No such file or directory",
            Self::NotADirectory(_)
            | Self::ParentNotDirectory(_)
            | Self::DestinationNotDirectory(_) => "Not a directory",
            Self::IsADirectory(_) => "Is a directory",
            Self::NameExists(_) => "File exists",
            Self::CannotMoveIntoSelf { .. } => "Invalid argument",
            Self::CannotDeleteRoot => "Operation not permitted",
            Self::DirectoryNotEmpty(_) => "Directory not empty",
            Self::InvalidName(_) => "Invalid argument",
        }
    }
}

/// Shell command errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("{command}: missing operand")]
    MissingOperand { command: &'static str },
    #[error("{command}: {message}")]
    InvalidFlagCombination {
        command: &'static str,
        message: &'static str,
    },
    #[error("{command}: invalid option -- '{flag}'")]
    InvalidOption { command: &'static str, flag: String },
    #[error("{command}: {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },
}

/// Environment variable errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("'{0}': not a valid identifier")]
    InvalidVariableName(String),
    #[error("'{0}': invalid alias name")]
    InvalidAliasName(String),
}

/// Backing store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// A broken structural invariant of the node arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant {invariant} violated: {detail}")]
pub struct InvariantViolation {
    /// Invariant number (1-6).
    pub invariant: u8,
    pub detail: String,
}

impl InvariantViolation {
    pub fn new(invariant: u8, detail: impl Into<String>) -> Self {
        Self {
            invariant,
            detail: detail.into(),
        }
    }
}

impl From<InvariantViolation> for StorageError {
    fn from(err: InvariantViolation) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_display() {
        assert_eq!(
            FsError::NotFound("/x".to_string()).to_string(),
            "/x: No such file or directory"
        );
        assert_eq!(
            FsError::CannotMoveIntoSelf {
                from: "/a".to_string(),
                to: "/a/b".to_string()
            }
            .to_string(),
            "cannot move '/a' into itself, '/a/b'"
        );
    }

    #[test]
    fn test_fs_error_reason() {
        assert_eq!(
            FsError::ParentNotFound("/x".into()).reason(),
            "No such file or directory"
        );
        assert_eq!(FsError::IsADirectory("/x".into()).reason(), "Is a directory");
    }

    #[test]
    fn test_shell_error_display() {
        assert_eq!(
            ShellError::CommandNotFound("foo".into()).to_string(),
            "command not found: foo"
        );
        assert_eq!(
            ShellError::MissingOperand { command: "mkdir" }.to_string(),
            "mkdir: missing operand"
        );
        assert_eq!(
            ShellError::InvalidOption {
                command: "ls",
                flag: "z".into()
            }
            .to_string(),
            "ls: invalid option -- 'z'"
        );
    }
}
