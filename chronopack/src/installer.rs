//! Installer build invocation.
//!
//! The installer compiler is an external program run against an installer
//! definition script. Its exit status and the presence of its output file
//! are both checked before the installer is moved into place.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{PackError, PackResult};
use crate::pipeline::{PipelineObserver, Step};
use crate::profile::PackagingProfile;
use crate::report::sha256_file;
use crate::staging::fs::{ensure_dir, move_replacing, remove_file_if_exists};

/// Maximum characters of tool output kept in a [`PackError::ToolFailed`].
const OUTPUT_TAIL_CHARS: usize = 2000;

/// Something that turns an installer script into an installer executable.
pub trait InstallerCompiler {
    /// Compile `script` with `script_dir` as the working directory.
    ///
    /// Returns once the compiler has exited; an unsuccessful exit is an error.
    fn compile(&self, script_dir: &Path, script: &str) -> PackResult<()>;

    /// Confirm the compiler can be run at all.
    fn check_available(&self) -> PackResult<()> {
        Ok(())
    }
}

/// NSIS `makensis` compiler.
#[derive(Debug, Clone)]
pub struct MakensisCompiler {
    program: PathBuf,
}

impl MakensisCompiler {
    /// Create a compiler invoking `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for MakensisCompiler {
    fn default() -> Self {
        Self::new(crate::profile::DEFAULT_COMPILER)
    }
}

impl InstallerCompiler for MakensisCompiler {
    fn compile(&self, script_dir: &Path, script: &str) -> PackResult<()> {
        let script_path = script_dir.join(script);
        if !script_path.is_file() {
            return Err(PackError::MissingSource(script_path));
        }

        info!(compiler = %self.program.display(), script, "running installer compiler");
        let output = Command::new(&self.program)
            .current_dir(script_dir)
            .arg(script)
            .output()
            .map_err(|e| PackError::ToolLaunchFailed {
                tool: self.tool_name(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(target: "chronopack::installer::tool", "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(PackError::ToolFailed {
                tool: self.tool_name(),
                status: output.status,
                output: tail(detail, OUTPUT_TAIL_CHARS),
            });
        }

        Ok(())
    }

    fn check_available(&self) -> PackResult<()> {
        let output = Command::new(&self.program)
            .arg("-VERSION")
            .output()
            .map_err(|e| PackError::ToolLaunchFailed {
                tool: self.tool_name(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(PackError::ToolFailed {
                tool: self.tool_name(),
                status: output.status,
                output: tail(String::from_utf8_lossy(&output.stderr).trim(), OUTPUT_TAIL_CHARS),
            });
        }
        Ok(())
    }
}

/// Last `max` characters of `text`.
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let skipped: String = text.chars().skip(count - max).collect();
    format!("...{}", skipped)
}

/// A finished installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltInstaller {
    /// Final location of the installer executable.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// SHA-256 of the installer, lowercase hex.
    pub sha256: String,
}

/// Run the installer compiler for `profile` and move its output into the
/// installer directory, replacing any previous installer of the same name.
pub fn build_installer(
    profile: &PackagingProfile,
    compiler: &dyn InstallerCompiler,
    observer: &dyn PipelineObserver,
) -> PackResult<BuiltInstaller> {
    let spec = &profile.installer;
    let produced = spec.script_dir.join(&spec.output_name);

    // A leftover from an earlier run must not pass for fresh output.
    if remove_file_if_exists(&produced)? {
        debug!(path = %produced.display(), "removed previous compiler output");
    }

    compiler.compile(&spec.script_dir, &spec.script)?;

    if !produced.is_file() {
        return Err(PackError::InstallerOutputMissing(produced));
    }

    ensure_dir(&spec.output_dir)?;
    let path = profile.installer_path();
    move_replacing(&produced, &path)?;

    let size = fs::metadata(&path)
        .map_err(|e| PackError::ReadFailed {
            path: path.clone(),
            source: e,
        })?
        .len();
    let sha256 = sha256_file(&path)?;

    info!(profile = %profile.name, installer = %path.display(), bytes = size, "installer built");
    observer.item(
        &profile.name,
        Step::BuildInstaller,
        &format!("{} successfully created.", path.display()),
    );

    Ok(BuiltInstaller { path, size, sha256 })
}
