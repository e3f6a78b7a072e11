use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::executor::{ExecutionResult, RunStatus};
use crate::plan::{Criticality, PhasePlan};
use crate::runner::Outcome;
use crate::util::format_duration;

use super::collect::Artifact;
use super::Collection;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub job: String,
    pub outcome: Outcome,
    pub criticality: Criticality,
    pub duration_ms: u64,
    pub log_path: PathBuf,
}

/// Read-only view of a finished run: outcomes, artifacts and where things
/// ended up.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Local>,
    /// Wall clock from run start to the end of collection.
    pub duration_ms: u64,
    pub entries: Vec<ReportEntry>,
    /// Declared jobs that were never attempted because of an abort.
    pub not_run: Vec<String>,
    pub artifacts: Vec<Artifact>,
    pub missing_mandatory: Vec<String>,
    pub output_dir: PathBuf,
    pub installer: Option<PathBuf>,
    pub log_dir: PathBuf,
}

impl RunReport {
    pub fn from_execution(
        plan: &PhasePlan,
        result: &ExecutionResult,
        artifacts: Vec<Artifact>,
        missing_mandatory: Vec<String>,
        output_dir: PathBuf,
        installer: Option<PathBuf>,
        log_dir: PathBuf,
        elapsed: Duration,
    ) -> Self {
        let entries = result
            .job_results
            .iter()
            .map(|r| ReportEntry {
                job: r.job_name.clone(),
                outcome: r.outcome,
                criticality: plan
                    .jobs()
                    .find(|j| j.name == r.job_name)
                    .map(|j| j.criticality)
                    .unwrap_or_default(),
                duration_ms: r.duration_ms,
                log_path: r.log_path.clone(),
            })
            .collect();
        let not_run = plan
            .jobs()
            .filter(|j| !result.ledger.contains(&j.name))
            .map(|j| j.name.clone())
            .collect();

        Self {
            run_id: result.run_id.clone(),
            status: result.status.clone(),
            started_at: result.started_at,
            duration_ms: elapsed.as_millis() as u64,
            entries,
            not_run,
            artifacts,
            missing_mandatory,
            output_dir,
            installer,
            log_dir,
        }
    }

    /// Report for a collection pass over existing build directories.
    pub fn collection_only(
        collection: Collection,
        output_dir: PathBuf,
        log_dir: PathBuf,
        started_at: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: RunStatus::Completed,
            started_at,
            duration_ms: elapsed.as_millis() as u64,
            entries: Vec::new(),
            not_run: Vec::new(),
            artifacts: collection.artifacts,
            missing_mandatory: collection.missing_mandatory,
            output_dir,
            installer: Some(collection.installer),
            log_dir,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Human-readable summary for stdout.
    pub fn render_summary(&self, ascii: bool) -> String {
        let mut s = String::new();
        let _ = writeln!(
            s,
            "\nRun {} {} in {}",
            short_id(&self.run_id),
            self.status,
            format_duration(Duration::from_millis(self.duration_ms))
        );

        if !self.entries.is_empty() {
            let width = self.entries.iter().map(|e| e.job.len()).max().unwrap_or(0);
            s.push('\n');
            for e in &self.entries {
                let _ = write!(
                    s,
                    "  {:<7} {:<width$}  {:<18} {:>9}",
                    e.outcome.symbol(ascii),
                    e.job,
                    e.outcome.as_str(),
                    format_duration(Duration::from_millis(e.duration_ms)),
                );
                if e.criticality == Criticality::Optional {
                    s.push_str("  (optional)");
                }
                s.push('\n');
            }
        }
        for name in &self.not_run {
            let _ = writeln!(s, "  {:<7} {}  not run", "-", name);
        }

        let _ = writeln!(
            s,
            "\nArtifacts ({}) in {}:",
            self.artifacts.len(),
            self.output_dir.display()
        );
        for a in &self.artifacts {
            let _ = writeln!(
                s,
                "  {}  [{} {}] from {}",
                a.file_name,
                a.category,
                a.version.as_deref().unwrap_or("?"),
                a.source_job
            );
        }
        for name in &self.missing_mandatory {
            let _ = writeln!(s, "  mandatory artifact missing: {name}");
        }
        if let Some(installer) = &self.installer {
            let _ = writeln!(s, "Installer: {}", installer.display());
        }

        let _ = writeln!(s, "\nLogs in {}:", self.log_dir.display());
        for e in &self.entries {
            let _ = writeln!(s, "  {}", e.log_path.display());
        }
        s
    }
}

fn short_id(run_id: &str) -> &str {
    run_id.get(..8).unwrap_or(run_id)
}
