//! Selecting which files go into an archive.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PackError, PackResult};
use crate::profile::{normalize_rel_dir, ArchiveSpec};

/// Suffix allow-list with forbidden compound suffixes.
#[derive(Debug, Clone)]
pub struct SuffixFilter<'a> {
    allowed: &'a [String],
    forbidden: &'a [String],
}

impl<'a> SuffixFilter<'a> {
    pub fn new(allowed: &'a [String], forbidden: &'a [String]) -> Self {
        Self { allowed, forbidden }
    }

    /// Filter for an archive spec.
    pub fn for_spec(spec: &'a ArchiveSpec) -> Self {
        Self::new(&spec.suffixes, &spec.forbidden_suffixes)
    }

    /// The first allowed suffix `file_name` ends with.
    ///
    /// Returns `None` when no allowed suffix matches or when the name ends
    /// with a forbidden suffix, e.g. `wave1.world.xml` is rejected by a
    /// forbidden `.world.xml` even though `.xml` is allowed.
    pub fn matching_suffix(&self, file_name: &str) -> Option<&'a str> {
        if self
            .forbidden
            .iter()
            .any(|f| !f.is_empty() && file_name.ends_with(f.as_str()))
        {
            return None;
        }
        self.allowed
            .iter()
            .find(|s| !s.is_empty() && file_name.ends_with(s.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.matching_suffix(file_name).is_some()
    }
}

/// A file selected for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Absolute path of the file on disk.
    pub source: PathBuf,

    /// Stored entry name: the path relative to the archive root, `/`-separated.
    pub name: String,
}

/// Build the stored entry name for `file_name` in relative directory `dir`.
pub fn entry_name(dir: &str, file_name: &str) -> String {
    let dir = normalize_rel_dir(dir);
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}

/// Collect the entries an archive spec selects.
///
/// Directories are scanned in the listed order and each one's regular files
/// in name order. A file is selected once at most, however many allowed
/// suffixes it matches and however many listed directories resolve to it.
pub fn select_entries(spec: &ArchiveSpec) -> PackResult<Vec<ArchiveEntry>> {
    if !spec.root.is_dir() {
        return Err(PackError::MissingSource(spec.root.clone()));
    }

    let filter = SuffixFilter::for_spec(spec);
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();

    for dir in &spec.dirs {
        let rel = normalize_rel_dir(dir);
        let dir_path = if rel.is_empty() {
            spec.root.clone()
        } else {
            spec.root.join(&rel)
        };

        for file_name in list_files(&dir_path)? {
            if filter.matching_suffix(&file_name).is_none() {
                continue;
            }
            if spec.exclusion.excludes(&rel, &file_name) {
                debug!(dir = %rel, file = %file_name, "excluded");
                continue;
            }

            let name = entry_name(&rel, &file_name);
            if !seen.insert(name.clone()) {
                continue;
            }
            entries.push(ArchiveEntry {
                source: dir_path.join(&file_name),
                name,
            });
        }
    }

    Ok(entries)
}

/// Names of the regular files directly inside `dir`, sorted. Names that are
/// not valid UTF-8 are skipped.
fn list_files(dir: &Path) -> PackResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(PackError::MissingSource(dir.to_path_buf()));
    }

    let read_failed = |e| PackError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            // No allowed suffix or entry name can be built from it
            Err(name) => warn!(dir = %dir.display(), file = ?name, "skipping non-UTF-8 file name"),
        }
    }
    names.sort();
    Ok(names)
}
