//! Integration tests for worker supervision.
//!
//! These use stub commands instead of compiled submissions so the
//! deadline, kill and silent-exit paths are exercised without a cargo
//! toolchain in the loop.

#![cfg(unix)]

use std::process::Command;
use std::time::{Duration, Instant};

use warden_core::execute::ExecutionResult;
use warden_core::{FailureKind, Supervisor};
use warden_report::wire::{self, WorkerReport};

fn sh(script: String) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(script);
    command
}

/// Write one framed worker report to a file a stub can `cat`.
fn frame_file(dir: &std::path::Path, report: &WorkerReport) -> std::path::PathBuf {
    let path = dir.join("frame.bin");
    let mut bytes = Vec::new();
    wire::write_frame(&mut bytes, report).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn value_frame_is_retrieved_exactly_once() {
    let temp = tempfile::tempdir().unwrap();
    let report = WorkerReport::Value {
        value: serde_json::json!({"type": "table", "columns": ["n"], "rows": [[1], [2], [3]]}),
    };
    let path = frame_file(temp.path(), &report);

    let supervisor = Supervisor::new();
    let result = supervisor
        .supervise(sh(format!("cat {}", path.display())), Duration::from_secs(5))
        .unwrap();

    match result {
        ExecutionResult::Success(value) => {
            assert_eq!(value["rows"].as_array().unwrap().len(), 3);
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(supervisor.workers_spawned(), 1);
}

#[test]
fn failure_frame_maps_to_runtime_failure() {
    let temp = tempfile::tempdir().unwrap();
    let report = WorkerReport::Failure {
        kind: FailureKind::DivideByZero,
        message: "attempt to divide by zero".to_string(),
    };
    let path = frame_file(temp.path(), &report);

    let result = Supervisor::new()
        .supervise(sh(format!("cat {}", path.display())), Duration::from_secs(5))
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::RuntimeFailure {
            kind: FailureKind::DivideByZero,
            message: "attempt to divide by zero".to_string(),
        }
    );
}

#[test]
fn silent_exit_is_no_result_produced() {
    let start = Instant::now();
    let result = Supervisor::new()
        .supervise(Command::new("true"), Duration::from_secs(5))
        .unwrap();

    assert_eq!(result, ExecutionResult::NoResultProduced);
    // Silent exits return on hangup, not on the deadline.
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[test]
fn garbage_output_is_no_result_produced() {
    let result = Supervisor::new()
        .supervise(sh("echo not-a-frame".to_string()), Duration::from_secs(5))
        .unwrap();
    assert_eq!(result, ExecutionResult::NoResultProduced);
}

#[test]
fn deadline_expiry_kills_the_worker() {
    let temp = tempfile::tempdir().unwrap();
    let marker = temp.path().join("survived");

    let deadline = Duration::from_secs(1);
    let start = Instant::now();
    let result = Supervisor::new()
        .supervise(
            sh(format!("sleep 3; echo alive > {}", marker.display())),
            deadline,
        )
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result, ExecutionResult::Timeout);
    // Returned within deadline + bounded epsilon.
    assert!(elapsed >= deadline);
    assert!(elapsed < deadline + Duration::from_secs(1), "took {elapsed:?}");

    // If the worker had survived the kill it would write the marker at
    // the 3 second mark; give it the chance to prove us wrong.
    std::thread::sleep(Duration::from_millis(2500));
    assert!(!marker.exists(), "worker outlived its request");
}

#[test]
fn timeout_is_authoritative_over_late_frames() {
    let temp = tempfile::tempdir().unwrap();
    let report = WorkerReport::Value {
        value: serde_json::json!({"type": "table", "columns": [], "rows": []}),
    };
    let path = frame_file(temp.path(), &report);

    // The frame would arrive at 2s; the deadline is 500ms.
    let result = Supervisor::new()
        .supervise(
            sh(format!("sleep 2; cat {}", path.display())),
            Duration::from_millis(500),
        )
        .unwrap();

    assert_eq!(result, ExecutionResult::Timeout);
}

#[test]
fn each_request_spawns_exactly_one_worker() {
    let supervisor = Supervisor::new();
    for _ in 0..3 {
        supervisor
            .supervise(Command::new("true"), Duration::from_secs(2))
            .unwrap();
    }
    assert_eq!(supervisor.workers_spawned(), 3);
}
