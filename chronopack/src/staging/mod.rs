//! Staging binaries, the manifest and third-party installers.
//!
//! Each step writes into the profile's staging directory, creating it if
//! needed and replacing whatever an earlier run left there. The directory
//! itself is never deleted.

mod binaries;
mod dependencies;
pub mod fs;

pub use binaries::{stage_binaries, stage_manifest};
pub use dependencies::{stage_dependencies, StagedDependencies};
