//! Command-line arguments.

use std::path::PathBuf;

use chronopack::profile::DEFAULT_CONFIG_FILENAME;
use clap::Parser;

/// Package ChronoRage releases: pack asset archives, stage binaries and
/// build the installers.
#[derive(Debug, Parser)]
#[command(name = "chronopack", version, about)]
pub struct Args {
    /// Packaging profile file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Run only this profile (repeatable; default runs every profile)
    #[arg(short, long = "profile", value_name = "NAME")]
    pub profiles: Vec<String>,

    /// Stage everything but don't build the installers
    #[arg(long)]
    pub skip_installer: bool,

    /// Installer compiler to use instead of the one each profile names
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
