use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tri-state result of one job invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// The executable unit could not be located or invoked at all.
    MissingDefinition,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::MissingDefinition => "missing_definition",
        }
    }

    pub fn symbol(&self, ascii: bool) -> &'static str {
        match (self, ascii) {
            (Outcome::Success, false) => "✓",
            (Outcome::Failure, false) => "✗",
            (Outcome::MissingDefinition, false) => "?",
            (Outcome::Success, true) => "OK",
            (Outcome::Failure, true) => "FAIL",
            (Outcome::MissingDefinition, true) => "MISSING",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

/// How a session's process ended. Both fields are `None` when the platform
/// reports neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReport {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitReport {
    pub fn code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            signal: None,
        }
    }

    pub fn signalled(signal: i32) -> Self {
        Self {
            exit_code: None,
            signal: Some(signal),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct JobRunResult {
    pub job_name: String,
    pub outcome: Outcome,
    pub exit: Option<ExitReport>,
    pub duration_ms: u64,
    pub log_path: PathBuf,
    /// Last `runner.capture_bytes` of combined output.
    pub output_tail: String,
    pub bytes_logged: u64,
    /// Why the job did not succeed, when known.
    pub diagnostic: Option<String>,
}
