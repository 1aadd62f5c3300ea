//! Packaging profiles.
//!
//! A [`PackagingProfile`] describes one release flavor (the full game, the
//! demo): which archives to build from which directories, which binaries and
//! manifest to stage, which third-party installers to ship and how to build
//! the installer. Profiles are loaded from an INI file by [`ReleaseConfig`].

mod loader;
mod types;

pub use loader::{ReleaseConfig, DEFAULT_CONFIG_FILENAME};
pub use types::{
    normalize_rel_dir, ArchiveKind, ArchiveSpec, DependencySpec, Exclusion, InstallerSpec,
    PackagingProfile, DEFAULT_COMPILER, DEFAULT_IGNORE_PATTERNS,
};

#[cfg(test)]
pub(crate) use types::tests::sample_profile;
