//! Cargo toolchain discovery and scratch project builds.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};

use super::scratch::ScratchProject;

/// How much compiler stderr to keep when a build fails.
const STDERR_TAIL: usize = 4000;

/// Locates and drives the cargo toolchain for worker builds.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cargo: PathBuf,
}

/// Outcome of building a scratch project.
#[derive(Debug)]
pub enum BuildOutcome {
    /// Build succeeded; the worker binary is at this path.
    Built(PathBuf),
    /// Admitted code failed to compile; message is the stderr tail.
    Failed(String),
}

impl Toolchain {
    /// Discover cargo on this machine.
    pub fn discover() -> Result<Self> {
        let cargo = which::which("cargo")
            .map_err(|e| Error::Toolchain(format!("cargo not found: {e}")))?;
        tracing::debug!(cargo = %cargo.display(), "toolchain discovered");
        Ok(Self { cargo })
    }

    /// Build a scratch project. Compile failures are a [`BuildOutcome`],
    /// not an error: they are an expected consequence of admitting
    /// unreviewed code.
    pub fn build(&self, project: &ScratchProject) -> Result<BuildOutcome> {
        let output = Command::new(&self.cargo)
            .args(["build", "--quiet"])
            .current_dir(project.dir())
            .output()
            .map_err(|e| Error::Toolchain(format!("failed to run cargo: {e}")))?;

        if output.status.success() {
            let binary = project.binary_path();
            if !binary.exists() {
                return Err(Error::Toolchain(format!(
                    "cargo reported success but {} is missing",
                    binary.display()
                )));
            }
            return Ok(BuildOutcome::Built(binary));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(BuildOutcome::Failed(tail(&stderr, STDERR_TAIL)))
    }
}

/// Last `max` bytes of `text`, on a char boundary.
fn tail(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
