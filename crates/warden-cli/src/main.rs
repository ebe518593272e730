//! Warden CLI - vet and run assistant-written report code against a
//! local data store.

mod import;
mod ingest;
mod output;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_core::{Engine, EngineConfig};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Self-hosted BI dashboard: admit and run external report code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Dashboard root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest CSV files from data-in/ into the data store
    Ingest,

    /// Print the master prompt for your AI assistant
    Prompt,

    /// Scan report code and save it under a name
    Import {
        /// Path to the code file
        file: PathBuf,

        /// Report name
        #[arg(long)]
        name: String,
    },

    /// List registered reports
    List,

    /// Run a registered report
    Run {
        /// Report name
        name: String,
    },

    /// Show recent audit records
    Audit {
        /// Number of records to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(&cli.root, config)?;

    let ok = match cli.command {
        Commands::Ingest => ingest::execute(&engine)?,
        Commands::Prompt => {
            println!("{}", engine.master_prompt()?);
            true
        }
        Commands::Import { file, name } => import::execute(&engine, &file, &name)?,
        Commands::List => {
            let reports = engine.list()?;
            if reports.is_empty() {
                println!("no reports registered");
            }
            for report in reports {
                println!("{}", report.name);
            }
            true
        }
        Commands::Run { name } => run::execute(&engine, &name)?,
        Commands::Audit { limit } => {
            for record in engine.audit_tail(limit)? {
                let status = if record.success { "ok" } else { "failed" };
                match record.error {
                    Some(error) => {
                        println!("{} {:8} {} - {}", record.timestamp, status, record.report_name, error)
                    }
                    None => println!("{} {:8} {}", record.timestamp, status, record.report_name),
                }
            }
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
