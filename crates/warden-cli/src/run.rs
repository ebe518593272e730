//! Run command: execute a registered report and display the result.

use warden_core::{Engine, Rendered};

use crate::output;

/// Run one report. Returns `false` (nonzero exit) on any failed
/// outcome; infrastructure faults propagate as errors.
pub fn execute(engine: &Engine, name: &str) -> anyhow::Result<bool> {
    let outcome = engine.run(name)?;

    if !outcome.success {
        println!("{}", outcome.message);
        return Ok(false);
    }

    match outcome.payload {
        Some(Rendered::Table(table)) => output::print_table(&table),
        Some(Rendered::Chart(chart)) => output::print_chart(&chart),
        None => {}
    }
    println!("\n{name}: {}", outcome.message);
    Ok(true)
}
