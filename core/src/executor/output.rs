//! Fallback lifecycle output when no renderer is installed: everything goes
//! through `tracing`.

use crate::plan::Criticality;
use crate::runner::JobRunResult;

use super::traits::PhaseOutline;
use super::types::{ExecutionOpts, ExecutionResult};

pub fn emit_run_start(run_id: &str, total_jobs: usize, total_phases: usize) {
    tracing::info!(run_id, total_jobs, total_phases, "run started");
}

pub fn emit_execution_plan(opts: &ExecutionOpts, run_id: &str, phases: &[PhaseOutline]) {
    for (i, (phase, jobs)) in phases.iter().enumerate() {
        if opts.verbose {
            tracing::info!(run_id, phase_id = i, phase = %phase, jobs = %jobs.join(", "), "planned phase");
        } else {
            tracing::debug!(run_id, phase_id = i, phase = %phase, jobs = %jobs.join(", "), "planned phase");
        }
    }
}

pub fn emit_phase_start(run_id: &str, phase_id: usize, phase: &str, job_names: &[String]) {
    tracing::info!(run_id, phase_id, phase, jobs = job_names.len(), "phase started");
}

pub fn emit_job_start(opts: &ExecutionOpts, run_id: &str, job: &str, criticality: Criticality) {
    if opts.verbose {
        tracing::info!(run_id, job, criticality = criticality.as_str(), "job started");
    } else {
        tracing::debug!(run_id, job, criticality = criticality.as_str(), "job started");
    }
}

pub fn emit_job_complete(run_id: &str, criticality: Criticality, result: &JobRunResult) {
    if result.outcome.is_success() {
        tracing::info!(
            run_id,
            job = %result.job_name,
            duration_ms = result.duration_ms,
            "job completed"
        );
    } else {
        tracing::warn!(
            run_id,
            job = %result.job_name,
            outcome = result.outcome.as_str(),
            criticality = criticality.as_str(),
            log = %result.log_path.display(),
            "job did not succeed"
        );
    }
}

pub fn emit_phase_end(run_id: &str, phase_id: usize, phase: &str) {
    tracing::debug!(run_id, phase_id, phase, "phase finished");
}

pub fn emit_run_end(run_id: &str, result: &ExecutionResult) {
    match result.abort_reason() {
        None => tracing::info!(
            run_id,
            jobs = result.ledger.len(),
            failed = result.failed(),
            duration_ms = result.duration_ms,
            "run completed"
        ),
        Some(job) => tracing::error!(
            run_id,
            job,
            jobs = result.ledger.len(),
            duration_ms = result.duration_ms,
            "run aborted by required job"
        ),
    }
}
