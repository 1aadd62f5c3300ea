//! Results of a packaging run.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::archive::PackedArchive;
use crate::error::{PackError, PackResult};
use crate::installer::BuiltInstaller;
use crate::staging::StagedDependencies;

/// What one profile run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReport {
    /// Profile name.
    pub profile: String,

    /// Staging directory the run assembled.
    pub staging_dir: PathBuf,

    /// Archives built, in packing order.
    pub archives: Vec<PackedArchive>,

    /// Staged binary paths.
    pub binaries: Vec<PathBuf>,

    /// Staged manifest path.
    pub manifest: PathBuf,

    /// Third-party installers copied.
    pub dependencies: StagedDependencies,

    /// The installer, unless the installer step was skipped.
    pub installer: Option<BuiltInstaller>,
}

impl ProfileReport {
    /// Total entries across all archives.
    pub fn entry_count(&self) -> usize {
        self.archives.iter().map(|a| a.entries.len()).sum()
    }

    /// Total bytes across all archives.
    pub fn archive_bytes(&self) -> u64 {
        self.archives.iter().map(|a| a.size).sum()
    }
}

/// Reports for every profile run, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub profiles: Vec<ProfileReport>,
}

/// SHA-256 of a file as lowercase hex.
pub fn sha256_file(path: &Path) -> PackResult<String> {
    let read_failed = |e| PackError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::open(path).map_err(read_failed)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024]; // 64KB buffer

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(read_failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Format a byte count for display, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
