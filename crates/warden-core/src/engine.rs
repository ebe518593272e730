//! Engine facade: the invocation boundary consumed by the presentation
//! layer.
//!
//! Owns the component instances and enforces the two cross-component
//! invariants: no execution request exists without an admitting
//! verdict (the [`AdmittedSubmission`](crate::scan::AdmittedSubmission)
//! proof token), and exactly one audit record is written per execution
//! attempt, after the final outcome is determined, on every exit path.

use std::collections::BTreeMap;
use std::path::Path;

use crate::audit::{AuditLogger, AuditRecord};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::execute::{
    BuildOutcome, ExecutionRequest, ExecutionResult, ScratchProject, Supervisor, Toolchain,
    scratch,
};
use crate::paths::DashboardDirs;
use crate::registry::{ReportRegistry, Submission};
use crate::render::{self, Rendered};
use crate::scan::PolicyScanner;
use crate::prompt;
use crate::store::{DataStore, IngestReport};

/// What `run` hands back to the presentation layer: a success flag and
/// either a displayable payload or a descriptive message.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    pub payload: Option<Rendered>,
    pub message: String,
}

impl RunOutcome {
    fn success(payload: Rendered, message: String) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            message,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            payload: None,
            message,
        }
    }
}

/// The code-admission and sandboxed-execution engine.
pub struct Engine {
    config: EngineConfig,
    dirs: DashboardDirs,
    store: DataStore,
    registry: ReportRegistry,
    audit: AuditLogger,
    supervisor: Supervisor,
}

impl Engine {
    /// Build an engine rooted at `root` with the given configuration.
    pub fn new(root: &Path, config: EngineConfig) -> Result<Self> {
        let dirs = DashboardDirs::from_root(root)?;
        let store = DataStore::open(dirs.db_path())?;
        let registry = ReportRegistry::new(dirs.db_path());
        let audit = AuditLogger::new(dirs.audit_path(), config.max_error_len);

        Ok(Self {
            config,
            dirs,
            store,
            registry,
            audit,
            supervisor: Supervisor::new(),
        })
    }

    /// Scan-then-save: the `import(code, name)` boundary.
    pub fn import(&self, code: &str, name: &str) -> Result<(bool, String)> {
        if code.trim().is_empty() || name.trim().is_empty() {
            return Ok((false, "please provide both code and a report name".to_string()));
        }

        let scanner = PolicyScanner::new(&self.config);
        let verdict = scanner.scan(code);
        if !verdict.admitted {
            tracing::info!(report = name, reason = verdict.reason(), "import rejected");
            return Ok((
                false,
                format!("security scan failed: {}", verdict.reason()),
            ));
        }

        if self.registry.save(name, code)? {
            tracing::info!(report = name, "report imported");
            Ok((true, format!("report '{name}' saved")))
        } else {
            Ok((
                false,
                format!("report '{name}' already exists, use a different name"),
            ))
        }
    }

    /// Run a registered report: the `run(submission_name)` boundary.
    ///
    /// Every path through here writes exactly one audit record.
    pub fn run(&self, name: &str) -> Result<RunOutcome> {
        let submission = self
            .registry
            .get(name)?
            .ok_or_else(|| Error::ReportNotFound(name.to_string()))?;

        // Re-scan at run time: code is vetted at import, but policy may
        // have tightened since, and the execution path only accepts the
        // scanner's proof token.
        let scanner = PolicyScanner::new(&self.config);
        let admitted = match scanner.vet(submission) {
            Ok(admitted) => admitted,
            Err(verdict) => {
                let message = format!("security scan failed: {}", verdict.reason());
                self.audit.record(name, false, Some(&message))?;
                return Ok(RunOutcome::failure(render::fix_it_guidance(&message)));
            }
        };

        let result = if !scratch::has_entry_point(admitted.source()) {
            ExecutionResult::MissingEntryPoint
        } else {
            let request = ExecutionRequest::new(
                admitted,
                self.store.path().to_path_buf(),
                self.config.deadline(),
            );
            match self.execute(&request) {
                Ok(result) => result,
                // Infrastructure faults (toolchain missing, scratch dir
                // I/O, spawn failure) are still attempts: audit them
                // before propagating.
                Err(e) => {
                    self.audit.record(name, false, Some(&e.to_string()))?;
                    return Err(e);
                }
            }
        };

        self.conclude(name, result)
    }

    /// Ingest waiting data files into the store.
    pub fn ingest(&self) -> Result<IngestReport> {
        self.store.ingest_new_files(&self.dirs)
    }

    /// The assistant-facing master prompt for the current schema.
    pub fn master_prompt(&self) -> Result<String> {
        let schema = self.report_schema()?;
        Ok(prompt::master_prompt(&schema, &self.config))
    }

    /// Registered submissions, ordered by name.
    pub fn list(&self) -> Result<Vec<Submission>> {
        self.registry.list()
    }

    /// Most recent audit records.
    pub fn audit_tail(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        self.audit.tail(limit)
    }

    /// Worker processes spawned over this engine's lifetime.
    pub fn workers_spawned(&self) -> u64 {
        self.supervisor.workers_spawned()
    }

    fn report_schema(&self) -> Result<BTreeMap<String, String>> {
        let mut schema = self.store.schema()?;
        // Internal bookkeeping columns are not part of the data shape.
        for reserved in ["id", "file_id", "row_hash"] {
            schema.remove(reserved);
        }
        Ok(schema)
    }

    /// Build and supervise one admitted request.
    fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let report_crate = scratch::find_report_crate()?;
        let project =
            ScratchProject::generate(&self.dirs.build, &request.submission, &report_crate)?;
        let toolchain = Toolchain::discover()?;

        match toolchain.build(&project)? {
            BuildOutcome::Failed(stderr) => Ok(ExecutionResult::RuntimeFailure {
                kind: crate::FailureKind::BuildFailed,
                message: stderr,
            }),
            BuildOutcome::Built(binary) => {
                self.supervisor
                    .run_worker(&binary, &request.db_path, request.deadline)
            }
        }
        // `project` drops here, removing the scratch tree on success,
        // failure and timeout alike.
    }

    /// Normalize, audit, report. The single audit write per attempt.
    fn conclude(&self, name: &str, result: ExecutionResult) -> Result<RunOutcome> {
        let outcome = match result {
            ExecutionResult::Success(value) => match render::adapt_value(value) {
                Ok(rendered) => {
                    self.audit.record(name, true, None)?;
                    let summary = match &rendered {
                        Rendered::Table(table) => format!("{} rows", table.rows.len()),
                        Rendered::Chart(chart) => format!("chart: {}", chart.title),
                    };
                    RunOutcome::success(rendered, summary)
                }
                Err(unsupported) => {
                    let message =
                        render::describe_failure(&unsupported, self.config.deadline_secs);
                    self.audit.record(name, false, Some(&message))?;
                    RunOutcome::failure(render::fix_it_guidance(&message))
                }
            },
            other => {
                let message = render::describe_failure(&other, self.config.deadline_secs);
                self.audit.record(name, false, Some(&message))?;
                RunOutcome::failure(render::fix_it_guidance(&message))
            }
        };

        tracing::info!(report = name, success = outcome.success, "run concluded");
        Ok(outcome)
    }
}
