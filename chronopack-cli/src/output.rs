//! Console progress trail and run summary.

use std::cell::RefCell;
use std::io::{self, Write};

use chronopack::pipeline::{PipelineObserver, Step};
use chronopack::report::{format_size, ProfileReport, ReleaseReport};
use console::style;

const RULE_WIDTH: usize = 60;

/// Prints a banner per step and a line per packed or copied item.
pub struct ConsoleOutput<W: Write> {
    out: RefCell<W>,
}

impl ConsoleOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleOutput<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    /// Write one line, ignoring a closed stdout.
    fn line(&self, text: &str) {
        let _ = writeln!(self.out.borrow_mut(), "{}", text);
    }

    fn rule(&self) {
        self.line(&"-".repeat(RULE_WIDTH));
    }

    /// Print the per-profile summary after a successful run.
    pub fn summary(&self, report: &ReleaseReport) {
        self.line("");
        self.rule();
        self.line(&style("Release summary").bold().to_string());
        self.rule();
        for profile in &report.profiles {
            self.profile_summary(profile);
        }
    }

    fn profile_summary(&self, report: &ProfileReport) {
        self.line(&format!(
            "{} ({})",
            style(&report.profile).bold(),
            report.staging_dir.display()
        ));
        for archive in &report.archives {
            self.line(&format!(
                "  {:<24} {:>5} entries  {:>10}",
                archive
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                archive.entries.len(),
                format_size(archive.size)
            ));
        }
        self.line(&format!(
            "  binaries: {}  installers copied: {}",
            report.binaries.len(),
            report.dependencies.payloads.len() + report.dependencies.trees.len()
        ));
        match &report.installer {
            Some(installer) => self.line(&format!(
                "  installer: {} ({}, sha256 {})",
                installer.path.display(),
                format_size(installer.size),
                installer.sha256
            )),
            None => self.line(&format!("  installer: {}", style("skipped").yellow())),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> PipelineObserver for ConsoleOutput<W> {
    fn step_started(&self, profile: &str, step: Step) {
        self.rule();
        self.line(&format!("{} [{}]", style(step).cyan().bold(), profile));
        self.rule();
    }

    fn item(&self, _profile: &str, _step: Step, item: &str) {
        self.line(&format!("  {}", item));
    }
}
