//! Staging third-party runtime installers.

use tracing::info;

use super::fs::{compile_patterns, copy_replacing, copy_tree_replacing, ensure_dir};
use crate::error::PackResult;
use crate::pipeline::{PipelineObserver, Step};
use crate::profile::PackagingProfile;

/// What [`stage_dependencies`] copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedDependencies {
    /// Standalone installers copied.
    pub payloads: Vec<String>,

    /// Installer trees replaced, with the number of files each contains.
    pub trees: Vec<(String, usize)>,
}

/// Copy standalone installers and replace installer trees in the staging
/// directory.
pub fn stage_dependencies(
    profile: &PackagingProfile,
    observer: &dyn PipelineObserver,
) -> PackResult<StagedDependencies> {
    let deps = &profile.dependencies;
    let ignore = compile_patterns(&deps.ignore)?;
    ensure_dir(&profile.staging_dir)?;

    let mut staged = StagedDependencies::default();

    for name in &deps.payloads {
        copy_replacing(&deps.source_dir.join(name), &profile.staging_dir.join(name))?;
        info!(profile = %profile.name, payload = %name, "installer staged");
        observer.item(&profile.name, Step::CopyDependencies, name);
        staged.payloads.push(name.clone());
    }

    for name in &deps.trees {
        let files = copy_tree_replacing(
            &deps.source_dir.join(name),
            &profile.staging_dir.join(name),
            &ignore,
        )?;
        info!(profile = %profile.name, tree = %name, files, "installer tree staged");
        observer.item(
            &profile.name,
            Step::CopyDependencies,
            &format!("{}/ ({} files)", name, files),
        );
        staged.trees.push((name.clone(), files));
    }

    Ok(staged)
}
