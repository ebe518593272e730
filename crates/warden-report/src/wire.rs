//! Wire protocol between worker and supervisor.
//!
//! The worker posts exactly one frame on stdout before exiting:
//! 4-byte length (u32 LE) + a JSON-encoded [`WorkerReport`]. The
//! supervisor reads exactly one frame and never writes back; there is
//! no command channel because a worker runs one report and dies.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Frames larger than this are rejected as corrupt.
const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// Wire protocol errors.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame codec failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("frame too large: {0} bytes")]
    Oversized(usize),
}

/// The single message a worker posts before exiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerReport {
    /// Entry point returned a value (serialized [`ReportValue`] JSON).
    ///
    /// [`ReportValue`]: crate::ReportValue
    Value { value: serde_json::Value },

    /// Entry point faulted; the fault was caught inside the worker.
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// Category of a captured execution fault.
///
/// `BuildFailed` and `UnsupportedResultType` are produced on the
/// supervising side (compile stage and result adapter); the rest are
/// posted by the worker harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Entry point returned `Err`.
    Report,
    /// Entry point panicked.
    Panic,
    /// Entry point panicked on integer division by zero.
    DivideByZero,
    /// Admitted code did not compile.
    BuildFailed,
    /// Returned value was neither a table nor a chart.
    UnsupportedResultType,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Report => "report error",
            Self::Panic => "panic",
            Self::DivideByZero => "division by zero",
            Self::BuildFailed => "build failed",
            Self::UnsupportedResultType => "unsupported result type",
        };
        f.write_str(name)
    }
}

/// Write one length-prefixed frame.
pub fn write_frame<W: Write>(writer: &mut W, message: &impl Serialize) -> Result<(), WireError> {
    let bytes = serde_json::to_vec(message)?;
    if bytes.len() > MAX_FRAME_LEN {
        return Err(WireError::Oversized(bytes.len()));
    }
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed frame.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, WireError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(WireError::Oversized(len));
    }

    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(serde_json::from_slice(&bytes)?)
}
