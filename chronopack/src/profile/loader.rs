//! Loading packaging profiles from an INI file.
//!
//! The file has a `[release]` section naming the product and the profiles to
//! run, a `[paths]` section of defaults shared by every profile, one
//! `[profile.<name>]` section per profile and one
//! `[profile.<name>.<archive>]` section per archive that profile builds.
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption, Properties};

use super::types::{
    resolve, ArchiveKind, ArchiveSpec, DependencySpec, Exclusion, InstallerSpec,
    PackagingProfile, DEFAULT_COMPILER, DEFAULT_IGNORE_PATTERNS,
};
use crate::error::{PackError, PackResult};

const RELEASE_SECTION: &str = "release";
const PATHS_SECTION: &str = "paths";

/// Default profile file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "packaging.ini";

/// All profiles defined by one profile file, in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Where the profiles were loaded from, if from a file.
    pub source: Option<PathBuf>,

    /// Profiles in run order.
    pub profiles: Vec<PackagingProfile>,
}

impl ReleaseConfig {
    /// Wrap already-built profiles.
    pub fn from_profiles(profiles: Vec<PackagingProfile>) -> PackResult<Self> {
        for profile in &profiles {
            profile.validate()?;
        }
        Ok(Self {
            source: None,
            profiles,
        })
    }

    /// Load profiles from an INI file.
    pub fn load(path: &Path) -> PackResult<Self> {
        if !path.is_file() {
            return Err(PackError::MissingSource(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| PackError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut config = Self::parse(&content, base_dir)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse profiles from INI text, resolving relative paths against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> PackResult<Self> {
        // Backslashes are kept literally so Windows-style paths survive.
        let options = ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options)
            .map_err(|e| PackError::Config(format!("invalid profile file: {}", e)))?;

        let release = ini.section(Some(RELEASE_SECTION)).ok_or_else(|| {
            PackError::Config(format!("missing [{}] section", RELEASE_SECTION))
        })?;
        let product = required(release, RELEASE_SECTION, "product")?.to_string();
        let names = split_list(required(release, RELEASE_SECTION, "profiles")?);
        if names.is_empty() {
            return Err(PackError::Config(format!(
                "[{}] profiles lists no profiles",
                RELEASE_SECTION
            )));
        }

        let paths = ini.section(Some(PATHS_SECTION));
        let mut profiles = Vec::with_capacity(names.len());
        for name in names {
            if profiles.iter().any(|p: &PackagingProfile| p.name == name) {
                return Err(PackError::Config(format!(
                    "profile '{}' listed twice",
                    name
                )));
            }
            let profile = ProfileSection::new(&ini, paths, &name, base_dir)?.build(&product)?;
            profile.validate()?;
            profiles.push(profile);
        }

        Ok(Self {
            source: None,
            profiles,
        })
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> PackResult<&PackagingProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PackError::UnknownProfile(name.to_string()))
    }

    /// Select profiles by name, keeping config order. No names selects all.
    pub fn select(&self, names: &[String]) -> PackResult<Vec<&PackagingProfile>> {
        if names.is_empty() {
            return Ok(self.profiles.iter().collect());
        }
        for name in names {
            self.profile(name)?;
        }
        Ok(self
            .profiles
            .iter()
            .filter(|p| names.iter().any(|n| *n == p.name))
            .collect())
    }

    /// Profile names in run order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }
}

/// One `[profile.<name>]` section with `[paths]` fallback.
struct ProfileSection<'a> {
    ini: &'a Ini,
    name: &'a str,
    section_name: String,
    section: &'a Properties,
    paths: Option<&'a Properties>,
    base_dir: &'a Path,
}

impl<'a> ProfileSection<'a> {
    fn new(
        ini: &'a Ini,
        paths: Option<&'a Properties>,
        name: &'a str,
        base_dir: &'a Path,
    ) -> PackResult<Self> {
        let section_name = format!("profile.{}", name);
        let section = ini.section(Some(section_name.as_str())).ok_or_else(|| {
            PackError::Config(format!("missing [{}] section", section_name))
        })?;
        Ok(Self {
            ini,
            name,
            section_name,
            section,
            paths,
            base_dir,
        })
    }

    /// Value from the profile section, falling back to `[paths]`.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.section
            .get(key)
            .or_else(|| self.paths.and_then(|p| p.get(key)))
    }

    fn require(&self, key: &str) -> PackResult<&'a str> {
        self.get(key).ok_or_else(|| {
            PackError::Config(format!(
                "[{}] is missing '{}' (and [{}] has no default)",
                self.section_name, key, PATHS_SECTION
            ))
        })
    }

    fn path(&self, key: &str) -> PackResult<PathBuf> {
        Ok(resolve(self.base_dir, self.require(key)?))
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }

    fn build(&self, product: &str) -> PackResult<PackagingProfile> {
        let mut archives = Vec::new();
        for kind in ArchiveKind::ALL {
            if let Some(spec) = self.archive(kind)? {
                archives.push(spec);
            }
        }

        let ignore = match self.get("ignore") {
            Some(value) => split_list(value),
            None => DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        };

        let payloads = self.list("payloads");
        let trees = self.list("payload_trees");
        // installs_dir only matters when something is copied from it
        let installs_dir = if payloads.is_empty() && trees.is_empty() {
            self.get("installs_dir")
                .map(|p| resolve(self.base_dir, p))
                .unwrap_or_else(|| self.base_dir.to_path_buf())
        } else {
            self.path("installs_dir")?
        };

        let mut profile = PackagingProfile {
            name: self.name.to_string(),
            product: self
                .section
                .get("product")
                .unwrap_or(product)
                .to_string(),
            staging_dir: self.path("staging_dir")?,
            archives,
            binaries_dir: self.path("binaries_dir")?,
            binaries: self.list("binaries"),
            manifest_dir: self.path("vfs_dir")?,
            manifest_source: self.require("manifest_source")?.to_string(),
            manifest_target: self.require("manifest_target")?.to_string(),
            dependencies: DependencySpec {
                source_dir: installs_dir,
                payloads,
                trees,
                ignore,
            },
            installer: InstallerSpec {
                compiler: PathBuf::from(self.get("compiler").unwrap_or(DEFAULT_COMPILER)),
                script_dir: self.path("script_dir")?,
                script: self.require("installer_script")?.to_string(),
                output_name: self.require("installer_output")?.to_string(),
                output_dir: self.path("installer_dir")?,
            },
        };
        profile.sort_archives();
        Ok(profile)
    }

    /// Parse `[profile.<name>.<archive>]` if present.
    fn archive(&self, kind: ArchiveKind) -> PackResult<Option<ArchiveSpec>> {
        let section_name = format!("{}.{}", self.section_name, kind.section_key());
        let Some(section) = self.ini.section(Some(section_name.as_str())) else {
            return Ok(None);
        };

        let root = resolve(self.base_dir, required(section, &section_name, "root")?);
        let dirs = split_list(required(section, &section_name, "dirs")?);
        let suffixes = split_list(required(section, &section_name, "suffixes")?);

        let mut spec = ArchiveSpec::new(kind, root, dirs, suffixes);
        for suffix in section.get("forbidden_suffixes").map(split_list).unwrap_or_default() {
            spec = spec.with_forbidden_suffix(suffix);
        }

        let excluded = section.get("exclude").map(split_list).unwrap_or_default();
        let exclusion = match section.get("exclude_scope").map(str::trim) {
            Some(scope) if !scope.is_empty() => Exclusion::scoped(excluded, scope),
            _ => Exclusion::by_name(excluded),
        };

        Ok(Some(spec.with_exclusion(exclusion)))
    }
}

fn required<'a>(section: &'a Properties, name: &str, key: &str) -> PackResult<&'a str> {
    section
        .get(key)
        .ok_or_else(|| PackError::Config(format!("[{}] is missing '{}'", name, key)))
}

/// Split a comma-separated list, trimming items and dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
