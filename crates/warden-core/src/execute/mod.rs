//! Execution pipeline for admitted submissions.
//!
//! An [`ExecutionRequest`] exists only for code that carries an
//! [`AdmittedSubmission`] proof token. The pipeline stages:
//! entry-point check → scratch project generation ([`scratch`]) →
//! cargo build ([`Toolchain`]) → deadline-bound worker run
//! ([`Supervisor`]).

mod compiler;
pub mod scratch;
mod supervisor;

pub use compiler::{BuildOutcome, Toolchain};
pub use scratch::ScratchProject;
pub use supervisor::Supervisor;

use std::path::PathBuf;
use std::time::Duration;

use warden_report::wire::FailureKind;

use crate::scan::AdmittedSubmission;

/// One run invocation for an admitted submission.
#[derive(Debug)]
pub struct ExecutionRequest {
    pub submission: AdmittedSubmission,
    pub db_path: PathBuf,
    pub deadline: Duration,
}

impl ExecutionRequest {
    pub fn new(submission: AdmittedSubmission, db_path: PathBuf, deadline: Duration) -> Self {
        Self {
            submission,
            db_path,
            deadline,
        }
    }
}

/// Final outcome of one execution request. Exactly one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Worker posted a value (serialized report value JSON).
    Success(serde_json::Value),

    /// A fault was captured and categorized.
    RuntimeFailure { kind: FailureKind, message: String },

    /// Deadline expired; the worker was forcibly terminated.
    Timeout,

    /// Submission defines no `generate_report(db)` entry point.
    MissingEntryPoint,

    /// Worker exited without posting a result.
    NoResultProduced,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
