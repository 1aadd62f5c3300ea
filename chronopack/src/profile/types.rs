//! Packaging profile types.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PackError, PackResult};

/// Default ignore patterns applied to third-party payload trees.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["*.svn", ".git"];

/// Default installer compiler program.
pub const DEFAULT_COMPILER: &str = "makensis";

/// The purpose-specific archives a profile can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArchiveKind {
    /// Textures, sounds, music, fonts and worlds.
    Data,
    /// Localization dictionaries.
    Dictionary,
    /// Level and wave definitions.
    Levels,
    /// Compiled shader objects.
    Shaders,
}

impl ArchiveKind {
    /// Packing order within a profile run.
    pub const ALL: [ArchiveKind; 4] = [
        ArchiveKind::Data,
        ArchiveKind::Dictionary,
        ArchiveKind::Levels,
        ArchiveKind::Shaders,
    ];

    /// Suffix appended to the product name to form the archive filename.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ArchiveKind::Data => "Data",
            ArchiveKind::Dictionary => "Dict",
            ArchiveKind::Levels => "Levels",
            ArchiveKind::Shaders => "Shaders",
        }
    }

    /// Key used for this archive's section in the profile file.
    pub fn section_key(&self) -> &'static str {
        match self {
            ArchiveKind::Data => "data",
            ArchiveKind::Dictionary => "dict",
            ArchiveKind::Levels => "levels",
            ArchiveKind::Shaders => "shaders",
        }
    }

    /// Archive filename for a product, e.g. `ChronoRageLevels.pak`.
    pub fn archive_filename(&self, product: &str) -> String {
        format!("{}{}.pak", product, self.file_suffix())
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveKind::Data => "Data",
            ArchiveKind::Dictionary => "Dictionaries",
            ArchiveKind::Levels => "Levels",
            ArchiveKind::Shaders => "Shaders",
        };
        f.write_str(name)
    }
}

/// Normalize a relative directory for comparison and entry naming.
///
/// Backslashes become `/`, `.` components and empty components are dropped,
/// so `.\Waves`, `./Waves` and `Waves/` all become `Waves` and `.` becomes
/// the empty string.
pub fn normalize_rel_dir(dir: &str) -> String {
    dir.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Filenames to leave out of an archive, optionally only within one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusion {
    names: BTreeSet<String>,
    scope: Option<String>,
}

impl Exclusion {
    /// Exclude nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Exclude the named files wherever they are found.
    pub fn by_name<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            scope: None,
        }
    }

    /// Exclude the named files only when they sit directly in `dir`.
    ///
    /// Files with the same name in any other listed directory, including
    /// subdirectories of `dir`, are still packed.
    pub fn scoped<I, S>(names: I, dir: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            scope: Some(normalize_rel_dir(dir)),
        }
    }

    /// Whether `file_name` found in relative directory `dir` is excluded.
    pub fn excludes(&self, dir: &str, file_name: &str) -> bool {
        if !self.names.contains(file_name) {
            return false;
        }
        match &self.scope {
            None => true,
            Some(scope) => *scope == normalize_rel_dir(dir),
        }
    }

    /// Excluded filenames.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Directory the exclusion is restricted to, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// How one archive is assembled from the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    /// Which archive this is.
    pub kind: ArchiveKind,

    /// Directory entry names are relative to.
    pub root: PathBuf,

    /// Subdirectories of `root` to scan, in order. `.` scans `root` itself.
    pub dirs: Vec<String>,

    /// Allowed filename suffixes, checked in order; first match wins.
    pub suffixes: Vec<String>,

    /// Suffixes that reject a file even when an allowed suffix matches.
    pub forbidden_suffixes: Vec<String>,

    /// Files to leave out.
    pub exclusion: Exclusion,
}

impl ArchiveSpec {
    /// Create a spec scanning `dirs` under `root` for `suffixes`.
    pub fn new<D, S>(kind: ArchiveKind, root: impl Into<PathBuf>, dirs: D, suffixes: S) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            kind,
            root: root.into(),
            dirs: dirs.into_iter().map(Into::into).collect(),
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            forbidden_suffixes: Vec::new(),
            exclusion: Exclusion::none(),
        }
    }

    /// Reject files ending with `suffix`.
    pub fn with_forbidden_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.forbidden_suffixes.push(suffix.into());
        self
    }

    /// Set the exclusion rule.
    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusion = exclusion;
        self
    }

    fn validate(&self, profile: &str) -> PackResult<()> {
        if self.dirs.is_empty() {
            return Err(PackError::Config(format!(
                "profile '{}': {} archive lists no directories",
                profile, self.kind
            )));
        }
        if self.suffixes.iter().all(|s| s.is_empty()) {
            return Err(PackError::Config(format!(
                "profile '{}': {} archive lists no suffixes",
                profile, self.kind
            )));
        }
        Ok(())
    }
}

/// How the installer executable is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSpec {
    /// Installer compiler program.
    pub compiler: PathBuf,

    /// Directory holding the installer script; the compiler runs here and
    /// writes its output here.
    pub script_dir: PathBuf,

    /// Installer definition script filename.
    pub script: String,

    /// Filename of the executable the script produces.
    pub output_name: String,

    /// Directory the finished installer is moved into.
    pub output_dir: PathBuf,
}

/// Third-party runtime installers shipped next to the game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySpec {
    /// Directory the payloads are copied from.
    pub source_dir: PathBuf,

    /// Standalone installer executables, copied over any existing copy.
    pub payloads: Vec<String>,

    /// Installer directories, replaced wholesale.
    pub trees: Vec<String>,

    /// Glob patterns for names skipped while copying trees.
    pub ignore: Vec<String>,
}

/// Everything one packaging run needs to know.
///
/// Built once and never mutated while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingProfile {
    /// Profile name, e.g. `full` or `demo`.
    pub name: String,

    /// Product name prefixed to archive filenames.
    pub product: String,

    /// Directory assembled into the installed product layout.
    pub staging_dir: PathBuf,

    /// Archives to build, in packing order.
    pub archives: Vec<ArchiveSpec>,

    /// Build output directory holding the compiled binaries.
    pub binaries_dir: PathBuf,

    /// Binary filenames to stage; every one must exist.
    pub binaries: Vec<String>,

    /// Directory holding the virtual-filesystem manifest.
    pub manifest_dir: PathBuf,

    /// Release-flavored manifest filename.
    pub manifest_source: String,

    /// Canonical manifest filename in the staging directory.
    pub manifest_target: String,

    /// Third-party installers.
    pub dependencies: DependencySpec,

    /// Installer build settings.
    pub installer: InstallerSpec,
}

impl PackagingProfile {
    /// Archive spec for `kind`, if this profile builds one.
    pub fn archive(&self, kind: ArchiveKind) -> Option<&ArchiveSpec> {
        self.archives.iter().find(|a| a.kind == kind)
    }

    /// Path of `kind`'s archive in the staging directory.
    pub fn archive_path(&self, kind: ArchiveKind) -> PathBuf {
        self.staging_dir.join(kind.archive_filename(&self.product))
    }

    /// Path of the staged manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir.join(&self.manifest_target)
    }

    /// Final path of the built installer.
    pub fn installer_path(&self) -> PathBuf {
        self.installer.output_dir.join(&self.installer.output_name)
    }

    /// Check the profile for mistakes that would otherwise surface mid-run.
    pub fn validate(&self) -> PackResult<()> {
        if self.product.is_empty() {
            return Err(PackError::Config(format!(
                "profile '{}': product name is empty",
                self.name
            )));
        }
        if self.binaries.is_empty() {
            return Err(PackError::Config(format!(
                "profile '{}': no binaries listed",
                self.name
            )));
        }
        if self.manifest_source == self.manifest_target {
            return Err(PackError::Config(format!(
                "profile '{}': manifest source and target are both '{}'",
                self.name, self.manifest_source
            )));
        }
        if self.installer.script.is_empty() || self.installer.output_name.is_empty() {
            return Err(PackError::Config(format!(
                "profile '{}': installer script and output must be set",
                self.name
            )));
        }

        let mut seen = BTreeSet::new();
        for archive in &self.archives {
            if !seen.insert(archive.kind) {
                return Err(PackError::Config(format!(
                    "profile '{}': {} archive defined twice",
                    self.name, archive.kind
                )));
            }
            archive.validate(&self.name)?;
        }
        Ok(())
    }

    /// Put archive specs in packing order.
    pub(crate) fn sort_archives(&mut self) {
        self.archives.sort_by_key(|a| a.kind);
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub(crate) fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
