//! Error types for release packaging.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for packaging operations.
pub type PackResult<T> = Result<T, PackError>;

/// Broad failure classes a packaging run can end with.
///
/// Every [`PackError`] maps onto exactly one of these; none is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing source, permission failure, or a destination that cannot be
    /// created, removed or moved.
    FileSystem,
    /// Failure while adding an entry to or finalizing an archive.
    ArchiveWrite,
    /// The installer compiler could not run, failed, or produced nothing.
    ExternalTool,
    /// The profile file is malformed or names something that doesn't exist.
    Config,
}

/// Errors that can occur while packaging a release.
#[derive(Debug, Error)]
pub enum PackError {
    /// Failed to create directory.
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read a file or list a directory.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to copy a file.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to move a file into place.
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to remove a stale file or tree.
    #[error("failed to remove {}: {source}", .path.display())]
    RemoveFailed { path: PathBuf, source: io::Error },

    /// A source directory or file required by the run does not exist.
    #[error("missing source: {}", .0.display())]
    MissingSource(PathBuf),

    /// Writing or finalizing an archive failed.
    #[error("archive {} failed: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    /// The installer compiler could not be started.
    #[error("failed to launch '{tool}': {source}")]
    ToolLaunchFailed { tool: String, source: io::Error },

    /// The installer compiler exited unsuccessfully.
    #[error("'{tool}' exited with {status}: {output}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        output: String,
    },

    /// The installer compiler succeeded but its output file is missing.
    #[error("installer output not found at {}", .0.display())]
    InstallerOutputMissing(PathBuf),

    /// Invalid packaging configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A profile was requested that the configuration does not define.
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
}

impl PackError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::CreateDirectoryFailed { .. }
            | PackError::ReadFailed { .. }
            | PackError::WriteFailed { .. }
            | PackError::CopyFailed { .. }
            | PackError::MoveFailed { .. }
            | PackError::RemoveFailed { .. }
            | PackError::MissingSource(_) => ErrorKind::FileSystem,
            PackError::Archive { .. } => ErrorKind::ArchiveWrite,
            PackError::ToolLaunchFailed { .. }
            | PackError::ToolFailed { .. }
            | PackError::InstallerOutputMissing(_) => ErrorKind::ExternalTool,
            PackError::Config(_) | PackError::UnknownProfile(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        PackError::Archive {
            path: path.into(),
            source,
        }
    }
}
