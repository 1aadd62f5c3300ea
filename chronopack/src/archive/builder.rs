//! Writing store-mode archives into the staging directory.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::filter::{select_entries, ArchiveEntry};
use crate::error::{PackError, PackResult};
use crate::pipeline::{PipelineObserver, Step};
use crate::profile::{ArchiveKind, ArchiveSpec};
use crate::staging::fs::{ensure_dir, move_replacing};

/// An archive placed in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArchive {
    /// Which archive this is.
    pub kind: ArchiveKind,

    /// Final location in the staging directory.
    pub path: PathBuf,

    /// Stored entry names, in write order.
    pub entries: Vec<String>,

    /// Archive size in bytes.
    pub size: u64,
}

/// An archive being written.
///
/// Entries go into a partial file next to the destination; [`finish`]
/// closes it and moves it over any previous archive of the same name, so a
/// failed run never leaves a truncated archive under the final name.
///
/// [`finish`]: ArchiveTarget::finish
pub struct ArchiveTarget {
    kind: ArchiveKind,
    path: PathBuf,
    partial: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    entries: Vec<String>,
}

impl ArchiveTarget {
    /// Start writing `kind`'s archive at `path`.
    pub fn create(kind: ArchiveKind, path: PathBuf) -> PackResult<Self> {
        let partial = partial_path(&path);
        let file = File::create(&partial).map_err(|e| PackError::WriteFailed {
            path: partial.clone(),
            source: e,
        })?;

        Ok(Self {
            kind,
            path,
            partial,
            writer: ZipWriter::new(BufWriter::new(file)),
            entries: Vec::new(),
        })
    }

    /// Store `entry` uncompressed under its relative name.
    pub fn add(&mut self, entry: &ArchiveEntry) -> PackResult<()> {
        let mut source = File::open(&entry.source).map_err(|e| PackError::ReadFailed {
            path: entry.source.clone(),
            source: e,
        })?;

        self.writer
            .start_file(entry.name.as_str(), entry_options())
            .map_err(|e| PackError::archive(&self.path, e))?;
        io::copy(&mut source, &mut self.writer)
            .map_err(|e| PackError::archive(&self.path, e.into()))?;

        self.entries.push(entry.name.clone());
        Ok(())
    }

    /// Entry names added so far.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Close the archive and move it into place.
    pub fn finish(self) -> PackResult<PackedArchive> {
        let Self {
            kind,
            path,
            partial,
            writer,
            entries,
        } = self;

        let mut inner = writer.finish().map_err(|e| PackError::archive(&path, e))?;
        inner
            .flush()
            .map_err(|e| PackError::archive(&path, e.into()))?;
        drop(inner);

        move_replacing(&partial, &path)?;

        let size = fs::metadata(&path)
            .map_err(|e| PackError::ReadFailed {
                path: path.clone(),
                source: e,
            })?
            .len();

        Ok(PackedArchive {
            kind,
            path,
            entries,
            size,
        })
    }

    /// Drop the partial file without touching any previous archive.
    fn abandon(self) {
        let partial = self.partial.clone();
        drop(self);
        // Best effort: the run is already failing with a more useful error.
        let _ = fs::remove_file(partial);
    }
}

/// Fixed per-entry options: stored, with a constant timestamp so rebuilding
/// from unchanged inputs produces an identical archive.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

/// Build one archive from `spec` into `staging_dir`.
///
/// The staging directory is created if needed. Any previous archive of the
/// same name is replaced, never appended to.
pub fn pack_archive(
    spec: &ArchiveSpec,
    product: &str,
    staging_dir: &Path,
    profile: &str,
    observer: &dyn PipelineObserver,
) -> PackResult<PackedArchive> {
    let entries = select_entries(spec)?;
    ensure_dir(staging_dir)?;

    let path = staging_dir.join(spec.kind.archive_filename(product));
    let step = Step::Pack(spec.kind);
    let mut target = ArchiveTarget::create(spec.kind, path)?;

    for entry in &entries {
        if let Err(e) = target.add(entry) {
            target.abandon();
            return Err(e);
        }
        debug!(archive = %spec.kind, entry = %entry.name, "stored");
        observer.item(profile, step, &entry.name);
    }

    let packed = target.finish()?;
    info!(
        profile,
        archive = %packed.path.display(),
        entries = packed.entries.len(),
        bytes = packed.size,
        "archive packed"
    );
    Ok(packed)
}
