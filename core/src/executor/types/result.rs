use chrono::{DateTime, Local};
use serde::Serialize;

use crate::executor::ledger::Ledger;
use crate::runner::JobRunResult;

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "job", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every phase ran; optional failures are allowed.
    Completed,
    /// A required job failed or could not be invoked.
    AbortedAt(String),
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn abort_reason(&self) -> Option<&str> {
        match self {
            RunStatus::Completed => None,
            RunStatus::AbortedAt(job) => Some(job),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::AbortedAt(job) => write!(f, "aborted at '{job}'"),
        }
    }
}

/// Result of executing a phase plan
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub run_id: String,

    pub status: RunStatus,

    /// Job name -> outcome, in execution order
    pub ledger: Ledger,

    /// Per-job details, in execution order
    pub job_results: Vec<JobRunResult>,

    /// Declared jobs; more than `ledger.len()` after an abort
    pub total_jobs: usize,

    pub total_phases: usize,

    /// Phases entered, including the one an abort happened in
    pub phases_run: usize,

    pub started_at: DateTime<Local>,

    /// Wall-clock duration of the phase loop in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn abort_reason(&self) -> Option<&str> {
        self.status.abort_reason()
    }

    pub fn failed(&self) -> usize {
        self.ledger.iter().filter(|(_, o)| !o.is_success()).count()
    }

    pub fn job_result(&self, job_name: &str) -> Option<&JobRunResult> {
        self.job_results.iter().find(|r| r.job_name == job_name)
    }
}
