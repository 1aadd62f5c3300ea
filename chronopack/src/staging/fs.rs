//! File operations that replace what is already in the staging directory.
//!
//! Every helper takes explicit paths; nothing depends on the process working
//! directory.

use std::fs;
use std::path::Path;

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PackError, PackResult};

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: &Path) -> PackResult<()> {
    fs::create_dir_all(dir).map_err(|e| PackError::CreateDirectoryFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Remove a file if it exists.
pub fn remove_file_if_exists(path: &Path) -> PackResult<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|e| PackError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// Copy `from` to `to`, removing any stale `to` first. Returns bytes copied.
pub fn copy_replacing(from: &Path, to: &Path) -> PackResult<u64> {
    if !from.is_file() {
        return Err(PackError::MissingSource(from.to_path_buf()));
    }
    if remove_file_if_exists(to)? {
        debug!(path = %to.display(), "removed stale copy");
    }
    fs::copy(from, to).map_err(|e| PackError::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })
}

/// Move `from` to `to`, replacing any previous `to`.
///
/// A plain rename replaces `to` in one step where the platform allows it.
/// Only when that fails is the old `to` removed and the move retried, then
/// done as copy-then-delete, e.g. across filesystems.
pub fn move_replacing(from: &Path, to: &Path) -> PackResult<()> {
    if !from.is_file() {
        return Err(PackError::MissingSource(from.to_path_buf()));
    }
    if same_file(from, to) {
        return Ok(());
    }

    if let Err(e) = fs::rename(from, to) {
        debug!(from = %from.display(), to = %to.display(), error = %e, "rename failed, replacing");
        remove_file_if_exists(to)?;
        if fs::rename(from, to).is_ok() {
            return Ok(());
        }
        fs::copy(from, to).map_err(|e| PackError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;
        fs::remove_file(from).map_err(|e| PackError::RemoveFailed {
            path: from.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Whether `a` and `b` name the same existing file, however they are spelled.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Compile ignore patterns.
pub fn compile_patterns(patterns: &[String]) -> PackResult<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| PackError::Config(format!("invalid ignore pattern '{}': {}", p, e)))
        })
        .collect()
}

/// Replace the tree at `to` with a fresh copy of `from`.
///
/// Any existing `to` is deleted first; nothing is merged. Entries whose name
/// matches one of `ignore` are skipped along with everything beneath them.
/// Returns the number of files copied.
pub fn copy_tree_replacing(from: &Path, to: &Path, ignore: &[Pattern]) -> PackResult<usize> {
    if !from.is_dir() {
        return Err(PackError::MissingSource(from.to_path_buf()));
    }
    if to.exists() {
        fs::remove_dir_all(to).map_err(|e| PackError::RemoveFailed {
            path: to.to_path_buf(),
            source: e,
        })?;
    }
    ensure_dir(to)?;

    let ignored = |name: &str| ignore.iter().any(|p| p.matches(name));

    let mut copied = 0;
    let walker = WalkDir::new(from)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignored(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.map_err(|e| PackError::ReadFailed {
            path: e.path().unwrap_or(from).to_path_buf(),
            source: e.into(),
        })?;

        let rel = entry.path().strip_prefix(from).map_err(|_| {
            PackError::Config(format!(
                "{} is outside {}",
                entry.path().display(),
                from.display()
            ))
        })?;
        let target = to.join(rel);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| PackError::CopyFailed {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}
