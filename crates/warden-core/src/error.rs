//! Error types for warden-core.
//!
//! These cover infrastructure faults only. Domain outcomes of running a
//! submission (timeouts, captured panics, rejections) travel through
//! [`ExecutionResult`](crate::execute::ExecutionResult) and are never
//! `Err` at the engine boundary.

use thiserror::Error;

/// Result type for warden-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in warden-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Data store or registry query failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Ingestion of a data file failed.
    #[error("ingest error for {file}: {message}")]
    Ingest { file: String, message: String },

    /// No usable cargo toolchain on this machine.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// Worker result channel broke down in a way that is not a domain
    /// outcome (spawn failure, frame corruption).
    #[error("IPC error: {0}")]
    Ipc(String),

    /// Named report does not exist in the registry.
    #[error("report not found: {0}")]
    ReportNotFound(String),
}
