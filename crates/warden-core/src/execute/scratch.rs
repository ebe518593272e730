//! Scratch worker projects for admitted submissions.
//!
//! Each run builds a throwaway cargo project whose manifest names only
//! the pre-approved capability crates, so the submission cannot reach
//! any other dependency and still compile (allowlist by construction,
//! rather than subtracting primitives from an ambient namespace). The
//! generated `main` hands the submission's `generate_report` to the
//! harness as a plain function pointer; there is no name-based symbol
//! lookup at runtime.

use std::fs;
use std::path::{Path, PathBuf};

use syn::{FnArg, Item};

use crate::error::{Error, Result};
use crate::scan::AdmittedSubmission;

/// Name of the required entry function.
pub const ENTRY_FN: &str = "generate_report";

/// Crate name of the generated worker package.
const WORKER_PACKAGE: &str = "warden-report-job";

/// Check whether the submission defines `fn generate_report` with
/// exactly one argument, at the top level or inside an inline module.
///
/// Static location of the entry symbol: absent here means absent in the
/// build, so nothing is compiled or spawned for it.
pub fn has_entry_point(source: &str) -> bool {
    let Ok(file) = syn::parse_file(source) else {
        // Admitted code always parses; treat a parse failure as absent.
        return false;
    };
    items_have_entry(&file.items)
}

fn items_have_entry(items: &[Item]) -> bool {
    items.iter().any(|item| match item {
        Item::Fn(func) => {
            func.sig.ident == ENTRY_FN
                && func.sig.inputs.len() == 1
                && matches!(func.sig.inputs.first(), Some(FnArg::Typed(_)))
        }
        Item::Mod(module) => module
            .content
            .as_ref()
            .is_some_and(|(_, items)| items_have_entry(items)),
        _ => false,
    })
}

/// Locate the `warden-report` crate sources that generated workers
/// link against.
///
/// Lookup order:
/// 1. `WARDEN_REPORT_CRATE` environment variable
/// 2. `warden-report/` next to the current executable (shipped layout)
/// 3. the workspace sibling crate (development layout)
pub fn find_report_crate() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("WARDEN_REPORT_CRATE") {
        let path = PathBuf::from(path);
        if path.join("Cargo.toml").exists() {
            return Ok(path);
        }
    }

    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let candidate = exe_dir.join("warden-report");
        if candidate.join("Cargo.toml").exists() {
            return Ok(candidate);
        }
    }

    let dev_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../warden-report");
    if dev_path.join("Cargo.toml").exists() {
        return Ok(dev_path);
    }

    Err(Error::Toolchain(
        "could not find the warden-report crate; set WARDEN_REPORT_CRATE".to_string(),
    ))
}

/// A generated scratch project on disk.
#[derive(Debug)]
pub struct ScratchProject {
    dir: PathBuf,
}

impl ScratchProject {
    /// Generate a scratch project for one admitted submission under
    /// `build_dir`. `report_crate` is the path of the `warden-report`
    /// sources the worker links against.
    pub fn generate(
        build_dir: &Path,
        submission: &AdmittedSubmission,
        report_crate: &Path,
    ) -> Result<Self> {
        let dir = build_dir.join(format!("job-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("src"))?;

        fs::write(dir.join("Cargo.toml"), manifest(report_crate)?)?;
        fs::write(dir.join("src").join("main.rs"), main_source(submission.source()))?;

        tracing::debug!(dir = %dir.display(), "generated scratch worker project");
        Ok(Self { dir })
    }

    /// Project directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the worker binary once built.
    pub fn binary_path(&self) -> PathBuf {
        self.dir.join("target").join("debug").join(WORKER_PACKAGE)
    }
}

impl Drop for ScratchProject {
    fn drop(&mut self) {
        // Scratch trees must not outlive their request.
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Manifest for the generated worker: the complete capability surface.
fn manifest(report_crate: &Path) -> Result<String> {
    let report_path = report_crate
        .canonicalize()
        .map_err(|e| Error::Toolchain(format!(
            "warden-report crate not found at {}: {e}",
            report_crate.display()
        )))?;

    let mut toml = String::new();
    toml.push_str("[package]\n");
    toml.push_str(&format!("name = \"{WORKER_PACKAGE}\"\n"));
    toml.push_str("version = \"0.0.0\"\n");
    toml.push_str("edition = \"2024\"\n");
    toml.push('\n');
    toml.push_str("[dependencies]\n");
    toml.push_str(&format!(
        "warden-report = {{ path = \"{}\" }}\n",
        report_path.display()
    ));
    toml.push_str("rusqlite = { version = \"0.38\", features = [\"bundled\"] }\n");
    toml.push_str("serde = { version = \"1.0\", features = [\"derive\"] }\n");
    toml.push_str("serde_json = \"1.0\"\n");
    toml.push('\n');
    // Keep the scratch tree out of any enclosing workspace.
    toml.push_str("[workspace]\n");
    Ok(toml)
}

/// Submission source plus the harness-driving `main`.
fn main_source(submission: &str) -> String {
    let mut source = String::with_capacity(submission.len() + 128);
    source.push_str(submission);
    source.push_str("\n\nfn main() -> std::process::ExitCode {\n");
    source.push_str(&format!("    warden_report::harness::drive({ENTRY_FN})\n"));
    source.push_str("}\n");
    source
}
