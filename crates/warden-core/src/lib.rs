//! Core engine for Warden: admit externally authored report code, run
//! it in an isolated worker process, normalize and audit the outcome.
//!
//! This crate provides:
//! - Policy scanning (import allowlist + textual denylist)
//! - Scratch-project construction for admitted submissions
//! - Deadline-bound worker supervision with unconditional termination
//! - Append-only audit logging
//! - Result adaptation into tabular/chart output
//! - The data store and report registry collaborators

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod execute;
pub mod paths;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod scan;
pub mod store;

pub use audit::{AuditLogger, AuditRecord};
pub use config::EngineConfig;
pub use engine::{Engine, RunOutcome};
pub use error::{Error, Result};
pub use execute::{ExecutionRequest, ExecutionResult, Supervisor, Toolchain};
pub use paths::DashboardDirs;
pub use registry::{ReportRegistry, Submission};
pub use render::{ChartOutput, Rendered, TableOutput};
pub use scan::{AdmittedSubmission, PolicyScanner, Verdict};
pub use store::{DataStore, IngestReport};

pub use warden_report::wire::FailureKind;
