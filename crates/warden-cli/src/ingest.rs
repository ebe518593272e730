//! Ingest command: pull waiting CSV files into the data store.

use warden_core::Engine;

pub fn execute(engine: &Engine) -> anyhow::Result<bool> {
    let report = engine.ingest()?;

    for file in &report.processed {
        println!(
            "{}: {} imported, {} duplicates skipped (archived as {})",
            file.file, file.imported, file.skipped, file.archived
        );
    }
    for error in &report.errors {
        eprintln!("{}: {}", error.file, error.error);
    }

    if report.processed.is_empty() && report.errors.is_empty() {
        println!("nothing to ingest in data-in/");
    }

    Ok(report.errors.is_empty())
}
