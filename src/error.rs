//! Error and warning types for envprof.
//!
//! Hard errors are rare here: a profile operation must never take the host
//! shell down with it. Most problems are downgraded to a [`Warning`] that the
//! caller reports and then carries on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by profile operations.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// `deactivate` was removed from the session by a destructive deactivation.
    #[error("deactivate is not available in this session (activate a profile first)")]
    DeactivateUnavailable,

    /// The serialized session record could not be decoded.
    #[error("invalid session record: {0}")]
    InvalidSession(#[from] serde_json::Error),
}

/// Convenience Result type for profile operations.
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Non-fatal conditions reported during activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The resolved profile directory does not exist on disk.
    DirectoryNotFound(PathBuf),
    /// The install location has no parent, so it was used as the profile directory.
    NoParentDirectory(PathBuf),
    /// No explicit directory and no install location were available.
    NoInstallLocation,
    /// The variable is set to a value that is not valid UTF-8 and was left untouched.
    UnreadableVariable(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DirectoryNotFound(dir) => {
                write!(f, "profile directory not found: {}", dir.display())
            }
            Warning::NoParentDirectory(dir) => write!(
                f,
                "install location {} has no parent directory, using it as the profile directory",
                dir.display()
            ),
            Warning::NoInstallLocation => write!(
                f,
                "no profile directory given and install location unknown, using the current directory"
            ),
            Warning::UnreadableVariable(name) => write!(
                f,
                "{name} is not valid UTF-8 and was left unchanged"
            ),
        }
    }
}
