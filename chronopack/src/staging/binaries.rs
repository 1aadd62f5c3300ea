//! Staging compiled binaries and the virtual-filesystem manifest.

use std::path::PathBuf;

use tracing::info;

use super::fs::{copy_replacing, ensure_dir};
use crate::error::{PackError, PackResult};
use crate::pipeline::{PipelineObserver, Step};
use crate::profile::PackagingProfile;

/// Copy every listed binary from the build output into the staging directory.
///
/// All binaries are checked before any is copied: a single missing file
/// fails the step and leaves the staging directory untouched.
pub fn stage_binaries(
    profile: &PackagingProfile,
    observer: &dyn PipelineObserver,
) -> PackResult<Vec<PathBuf>> {
    if !profile.binaries_dir.is_dir() {
        return Err(PackError::MissingSource(profile.binaries_dir.clone()));
    }
    if let Some(missing) = profile
        .binaries
        .iter()
        .map(|name| profile.binaries_dir.join(name))
        .find(|path| !path.is_file())
    {
        return Err(PackError::MissingSource(missing));
    }

    ensure_dir(&profile.staging_dir)?;

    let mut staged = Vec::with_capacity(profile.binaries.len());
    for name in &profile.binaries {
        let from = profile.binaries_dir.join(name);
        let to = profile.staging_dir.join(name);
        let bytes = copy_replacing(&from, &to)?;
        info!(profile = %profile.name, binary = %name, bytes, "binary staged");
        observer.item(&profile.name, Step::CopyBinaries, name);
        staged.push(to);
    }
    Ok(staged)
}

/// Copy the release manifest into the staging directory under its
/// canonical name.
pub fn stage_manifest(
    profile: &PackagingProfile,
    observer: &dyn PipelineObserver,
) -> PackResult<PathBuf> {
    let from = profile.manifest_dir.join(&profile.manifest_source);
    let to = profile.manifest_path();

    ensure_dir(&profile.staging_dir)?;
    copy_replacing(&from, &to)?;

    info!(
        profile = %profile.name,
        from = %profile.manifest_source,
        to = %profile.manifest_target,
        "manifest staged"
    );
    observer.item(
        &profile.name,
        Step::CopyManifest,
        &format!("{} -> {}", profile.manifest_source, profile.manifest_target),
    );
    Ok(to)
}
