//! ChronoPack CLI - command-line interface
//!
//! Loads the packaging profiles and runs them in order, printing a progress
//! trail on stdout and diagnostics on stderr.

mod args;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use chronopack::installer::{InstallerCompiler, MakensisCompiler};
use chronopack::pipeline::{run_release, PipelineOptions};
use chronopack::profile::{PackagingProfile, ReleaseConfig};
use clap::Parser;
use console::style;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use error::CliError;
use output::ConsoleOutput;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn failure_message(e: &CliError) -> String {
    format!("{} {}", style("error:").red().bold(), e)
}

fn init_logging(args: &Args) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = ReleaseConfig::load(&args.config).map_err(CliError::Config)?;
    info!(
        config = %args.config.display(),
        profiles = ?config.names(),
        "profiles loaded"
    );

    let override_compiler = args.compiler.clone();
    let compiler_for = move |profile: &PackagingProfile| -> Box<dyn InstallerCompiler> {
        let program: PathBuf = override_compiler
            .clone()
            .unwrap_or_else(|| profile.installer.compiler.clone());
        Box::new(MakensisCompiler::new(program))
    };

    let options = PipelineOptions {
        skip_installer: args.skip_installer,
    };
    let console = ConsoleOutput::stdout();
    let report = run_release(&config, &args.profiles, &compiler_for, options, &console)?;

    console.summary(&report);
    Ok(())
}
