//! Progress reporting hooks for pipeline runs.

use std::fmt;

use crate::profile::ArchiveKind;

/// One step of a profile run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Build one archive and move it into the staging directory.
    Pack(ArchiveKind),
    /// Copy the compiled binaries.
    CopyBinaries,
    /// Copy and rename the virtual-filesystem manifest.
    CopyManifest,
    /// Copy the third-party runtime installers.
    CopyDependencies,
    /// Run the installer compiler and collect its output.
    BuildInstaller,
}

impl Step {
    /// Every step in run order.
    pub fn all() -> Vec<Step> {
        let mut steps: Vec<Step> = ArchiveKind::ALL.iter().copied().map(Step::Pack).collect();
        steps.extend([
            Step::CopyBinaries,
            Step::CopyManifest,
            Step::CopyDependencies,
            Step::BuildInstaller,
        ]);
        steps
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Pack(kind) => write!(f, "Packing {}", kind),
            Step::CopyBinaries => f.write_str("Copy Binaries"),
            Step::CopyManifest => f.write_str("Copy VFS"),
            Step::CopyDependencies => f.write_str("Copy Dependency Installs"),
            Step::BuildInstaller => f.write_str("Make Installer"),
        }
    }
}

/// Receives progress from a pipeline run.
///
/// All methods default to doing nothing.
pub trait PipelineObserver {
    /// A step is about to run for `profile`.
    fn step_started(&self, _profile: &str, _step: Step) {}

    /// A step packed, copied or produced `item`.
    fn item(&self, _profile: &str, _step: Step, _item: &str) {}

    /// A step completed successfully.
    fn step_finished(&self, _profile: &str, _step: Step) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {}
