//! The profile pipeline: one ordered run per packaging profile.
//!
//! ```text
//! pack data -> pack dictionaries -> pack levels -> pack shaders
//!   -> copy binaries -> copy manifest -> copy dependency installs
//!   -> build installer
//! ```
//!
//! Every step runs to completion before the next starts. The first error
//! stops the run; artifacts already staged stay on disk.

pub(crate) mod observer;

pub use observer::{NullObserver, PipelineObserver, Step};

use tracing::{info, warn};

use crate::archive::pack_archive;
use crate::error::PackResult;
use crate::installer::{build_installer, InstallerCompiler};
use crate::profile::{ArchiveKind, PackagingProfile, ReleaseConfig};
use crate::report::{ProfileReport, ReleaseReport};
use crate::staging::{stage_binaries, stage_dependencies, stage_manifest};

/// Switches for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Stage everything but don't invoke the installer compiler.
    pub skip_installer: bool,
}

/// Runs every step of one profile.
pub struct Pipeline<'a> {
    profile: &'a PackagingProfile,
    compiler: &'a dyn InstallerCompiler,
}

impl<'a> Pipeline<'a> {
    pub fn new(profile: &'a PackagingProfile, compiler: &'a dyn InstallerCompiler) -> Self {
        Self { profile, compiler }
    }

    /// Run all steps in order.
    pub fn run(
        &self,
        options: PipelineOptions,
        observer: &dyn PipelineObserver,
    ) -> PackResult<ProfileReport> {
        let profile = self.profile;
        profile.validate()?;
        info!(profile = %profile.name, staging = %profile.staging_dir.display(), "profile started");

        let mut archives = Vec::with_capacity(profile.archives.len());
        let specs = ArchiveKind::ALL.iter().filter_map(|kind| profile.archive(*kind));
        for spec in specs {
            let step = Step::Pack(spec.kind);
            archives.push(self.step(step, observer, || {
                pack_archive(
                    spec,
                    &profile.product,
                    &profile.staging_dir,
                    &profile.name,
                    observer,
                )
            })?);
        }

        let binaries = self.step(Step::CopyBinaries, observer, || {
            stage_binaries(profile, observer)
        })?;
        let manifest = self.step(Step::CopyManifest, observer, || {
            stage_manifest(profile, observer)
        })?;
        let dependencies = self.step(Step::CopyDependencies, observer, || {
            stage_dependencies(profile, observer)
        })?;

        let installer = if options.skip_installer {
            info!(profile = %profile.name, "installer build skipped");
            None
        } else {
            Some(self.step(Step::BuildInstaller, observer, || {
                build_installer(profile, self.compiler, observer)
            })?)
        };

        info!(profile = %profile.name, "profile finished");
        Ok(ProfileReport {
            profile: profile.name.clone(),
            staging_dir: profile.staging_dir.clone(),
            archives,
            binaries,
            manifest,
            dependencies,
            installer,
        })
    }

    fn step<T>(
        &self,
        step: Step,
        observer: &dyn PipelineObserver,
        run: impl FnOnce() -> PackResult<T>,
    ) -> PackResult<T> {
        let name = &self.profile.name;
        observer.step_started(name, step);
        match run() {
            Ok(value) => {
                observer.step_finished(name, step);
                Ok(value)
            }
            Err(e) => {
                warn!(profile = %name, step = %step, error = %e, "step failed");
                Err(e)
            }
        }
    }
}

/// Run the named profiles of `config` one after another.
///
/// No names runs every profile in config order. The first failing profile
/// aborts the remaining ones.
pub fn run_release(
    config: &ReleaseConfig,
    profile_names: &[String],
    compiler_for: &dyn Fn(&PackagingProfile) -> Box<dyn InstallerCompiler>,
    options: PipelineOptions,
    observer: &dyn PipelineObserver,
) -> PackResult<ReleaseReport> {
    let profiles = config.select(profile_names)?;

    let compilers: Vec<Box<dyn InstallerCompiler>> =
        profiles.iter().map(|p| compiler_for(p)).collect();
    if !options.skip_installer {
        for compiler in &compilers {
            compiler.check_available()?;
        }
    }

    let mut report = ReleaseReport::default();
    for (profile, compiler) in profiles.into_iter().zip(&compilers) {
        let pipeline = Pipeline::new(profile, compiler.as_ref());
        report.profiles.push(pipeline.run(options, observer)?);
    }
    Ok(report)
}
