//! ChronoPack - release packaging for ChronoRage
//!
//! Turns a game build tree into an installable release: content is packed
//! into store-mode archives by file suffix, binaries and the release
//! manifest are staged next to them, third-party runtime installers are
//! copied in, and the installer compiler produces the final setup
//! executable.
//!
//! The work for one release flavor is described by a
//! [`PackagingProfile`](profile::PackagingProfile); a
//! [`Pipeline`](pipeline::Pipeline) runs its steps in order.
//!
//! ```no_run
//! use chronopack::installer::{InstallerCompiler, MakensisCompiler};
//! use chronopack::pipeline::{run_release, NullObserver, PipelineOptions};
//! use chronopack::profile::{PackagingProfile, ReleaseConfig};
//!
//! let config = ReleaseConfig::load("packaging.ini".as_ref())?;
//! let compiler_for = |p: &PackagingProfile| -> Box<dyn InstallerCompiler> {
//!     Box::new(MakensisCompiler::new(&p.installer.compiler))
//! };
//! let report = run_release(&config, &[], &compiler_for, PipelineOptions::default(), &NullObserver)?;
//! println!("{} profiles packaged", report.profiles.len());
//! # Ok::<(), chronopack::PackError>(())
//! ```

pub mod archive;
pub mod error;
pub mod installer;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod staging;

pub use error::{ErrorKind, PackError, PackResult};
pub use pipeline::{run_release, Pipeline, PipelineObserver, PipelineOptions, Step};
pub use profile::{PackagingProfile, ReleaseConfig};
pub use report::{ProfileReport, ReleaseReport};
