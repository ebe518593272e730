//! Import command: scan a code file and register it as a report.

use std::path::Path;

use anyhow::Context;
use warden_core::Engine;

pub fn execute(engine: &Engine, file: &Path, name: &str) -> anyhow::Result<bool> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;

    let (accepted, message) = engine.import(&code, name)?;
    println!("{message}");
    Ok(accepted)
}
