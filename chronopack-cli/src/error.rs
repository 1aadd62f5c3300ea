//! CLI error type.

use std::error::Error;
use std::fmt;

use chronopack::PackError;

/// Errors reported by the `chronopack` binary.
#[derive(Debug)]
pub enum CliError {
    /// A packaging step failed.
    Pack(PackError),
    /// The profile file could not be loaded.
    Config(PackError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pack(e) => write!(f, "{}", e),
            CliError::Config(e) => write!(f, "cannot load profiles: {}", e),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Pack(e) | CliError::Config(e) => e.source(),
        }
    }
}

impl From<PackError> for CliError {
    fn from(e: PackError) -> Self {
        CliError::Pack(e)
    }
}
