//! Runtime contract between Warden and generated report workers.
//!
//! Every admitted submission is compiled into a standalone worker binary
//! whose `main` hands a `generate_report` function pointer to
//! [`harness::drive`]. This crate is the only Warden code that runs
//! inside the worker process; everything it exposes is part of the
//! capability surface handed to untrusted report code:
//!
//! - [`ReportValue`]: the tabular-or-chart value a report must return
//! - [`ReportError`] / [`ReportResult`]: the entry point's error channel
//! - [`wire`]: length-prefixed result frames posted on the worker's stdout
//! - [`harness`]: opens the data store read-only and drives the entry
//!   exactly once behind `catch_unwind`
//!
//! The expected entry point:
//!
//! ```rust,ignore
//! fn generate_report(db: &rusqlite::Connection) -> warden_report::ReportResult {
//!     let mut table = Table::new(["region", "total"]);
//!     // ... query `data_records`, fill rows ...
//!     Ok(ReportValue::Table(table))
//! }
//! ```

pub mod harness;
pub mod wire;

mod value;

pub use value::{Chart, ChartKind, ReportValue, Series, Table};

use thiserror::Error;

/// Error channel for report entry points.
///
/// Query and JSON errors convert via `?`; anything else goes through
/// [`ReportError::msg`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// A data store query failed.
    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Stored `data_json` could not be decoded.
    #[error("data error: {0}")]
    Data(#[from] serde_json::Error),

    /// Report-specific failure.
    #[error("{0}")]
    Other(String),
}

impl ReportError {
    /// Construct a report-specific error from any message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// What a report entry point returns.
pub type ReportResult = std::result::Result<ReportValue, ReportError>;
