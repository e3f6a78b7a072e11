use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use uuid::Uuid;

use crate::config::RunLayout;
use crate::context::AppContext;
use crate::error::{ExecutorError, RunnerError};
use crate::plan::{Job, Phase, PhasePlan};
use crate::runner::{run_job, JobRunResult, Outcome, RunJobArgs};

use super::ledger::Ledger;
use super::output::{
    emit_execution_plan, emit_job_complete, emit_job_start, emit_phase_end, emit_phase_start,
    emit_run_end, emit_run_start,
};
use super::progress::ProgressMonitor;
use super::traits::{OutputRendererPlugin, PhaseOutline, RenderEvent};
use super::types::{ExecutionOpts, ExecutionResult, RunStatus};

/// Walks a phase plan one job at a time and records every outcome.
pub struct ExecutionEngine<'a> {
    ctx: &'a AppContext,
    opts: &'a ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

pub struct ExecutionEngineBuilder<'a> {
    ctx: &'a AppContext,
    opts: &'a ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

/// What the scheduler does after a job's outcome is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort,
}

/// The one place criticality meets outcome. `MissingDefinition` is treated
/// exactly like `Failure`.
pub fn decide(job: &Job, outcome: Outcome) -> Decision {
    if outcome.is_success() || !job.is_required() {
        Decision::Continue
    } else {
        Decision::Abort
    }
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(ctx: &'a AppContext, opts: &'a ExecutionOpts) -> Self {
        Self {
            ctx,
            opts,
            renderer: None,
        }
    }

    pub fn builder(ctx: &'a AppContext, opts: &'a ExecutionOpts) -> ExecutionEngineBuilder<'a> {
        ExecutionEngineBuilder::new(ctx, opts)
    }

    /// Run every phase in order, every job in declaration order, stopping at
    /// the first required job that does not succeed.
    ///
    /// Errors are reserved for the orchestrator's own I/O; job failures are
    /// reported through the result's ledger and status.
    pub async fn execute(&self, plan: &PhasePlan) -> Result<ExecutionResult, ExecutorError> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Local::now();
        let start = Instant::now();
        let layout = self.ctx.layout();
        let total_jobs = plan.job_count();
        let total_phases = plan.phases().len();

        self.emit_run_start(&run_id, total_jobs, total_phases);
        self.emit_plan(&run_id, plan);

        let mut progress = ProgressMonitor::new(total_jobs, self.opts.progress_bar, self.opts.ascii);
        let mut ledger = Ledger::new();
        let mut job_results = Vec::with_capacity(total_jobs);
        let mut status = RunStatus::Completed;
        let mut interrupted = None;
        let mut phases_run = 0;

        for (phase_id, phase) in plan.phases().iter().enumerate() {
            phases_run += 1;
            self.emit_phase_start(&run_id, phase_id, phase);
            progress.update_phase(phase_id, total_phases, &phase.name);

            for job in &phase.jobs {
                self.emit_job_start(&run_id, phase_id, job);
                progress.add_job(&job.name);

                let (result, fault) = match self.run_one(job, &layout, plan).await {
                    Ok(result) => (result, None),
                    Err(e) => {
                        tracing::error!(job = %job.name, error = %e, "run interrupted");
                        (interrupted_result(job, &layout, &e), Some(e))
                    }
                };
                ledger.record(&job.name, result.outcome)?;

                progress.complete_job(&job.name, result.outcome, result.duration_ms);
                self.emit_job_complete(&run_id, job, &result);
                // An orchestrator fault stops the run whatever the job's criticality.
                let decision = match fault {
                    Some(_) => Decision::Abort,
                    None => decide(job, result.outcome),
                };
                job_results.push(result);

                if decision == Decision::Abort {
                    status = RunStatus::AbortedAt(job.name.clone());
                    interrupted = fault.map(|e| (job.name.clone(), e));
                    break;
                }
            }

            self.emit_phase_end(&run_id, phase_id, phase);
            if !status.is_completed() {
                break;
            }
        }

        progress.finish(status.is_completed());

        let result = ExecutionResult {
            run_id: run_id.clone(),
            status,
            ledger,
            job_results,
            total_jobs,
            total_phases,
            phases_run,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.emit_run_end(&run_id, &result);

        match interrupted {
            None => Ok(result),
            Some((job, source)) => Err(ExecutorError::Interrupted {
                job,
                partial: Box::new(result),
                source,
            }),
        }
    }

    async fn run_one(
        &self,
        job: &Job,
        layout: &RunLayout,
        plan: &PhasePlan,
    ) -> Result<JobRunResult, RunnerError> {
        run_job(RunJobArgs {
            job,
            plugin: self.ctx.runner(),
            layout,
            runner: &self.ctx.cfg().runner,
            base_dir: plan.base_dir(),
        })
        .await
    }

    fn emit_run_start(&self, run_id: &str, total_jobs: usize, total_phases: usize) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunStart {
                run_id: run_id.to_string(),
                total_jobs,
                total_phases,
            });
        } else {
            emit_run_start(run_id, total_jobs, total_phases);
        }
    }

    fn emit_plan(&self, run_id: &str, plan: &PhasePlan) {
        let phases: Vec<PhaseOutline> = plan
            .phases()
            .iter()
            .map(|p| (p.name.clone(), p.jobs.iter().map(|j| j.name.clone()).collect()))
            .collect();
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::Plan {
                run_id: run_id.to_string(),
                phases,
            });
        } else {
            emit_execution_plan(self.opts, run_id, &phases);
        }
    }

    fn emit_phase_start(&self, run_id: &str, phase_id: usize, phase: &Phase) {
        let job_names: Vec<String> = phase.jobs.iter().map(|j| j.name.clone()).collect();
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::PhaseStart {
                run_id: run_id.to_string(),
                phase_id,
                phase: phase.name.clone(),
                job_names,
            });
        } else {
            emit_phase_start(run_id, phase_id, &phase.name, &job_names);
        }
    }

    fn emit_job_start(&self, run_id: &str, phase_id: usize, job: &Job) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::JobStart {
                run_id: run_id.to_string(),
                job: job.name.clone(),
                phase_id,
                criticality: job.criticality,
            });
        } else {
            emit_job_start(self.opts, run_id, &job.name, job.criticality);
        }
    }

    fn emit_job_complete(&self, run_id: &str, job: &Job, result: &JobRunResult) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::JobComplete {
                run_id: run_id.to_string(),
                criticality: job.criticality,
                result: result.clone(),
            });
        } else {
            emit_job_complete(run_id, job.criticality, result);
        }
    }

    fn emit_phase_end(&self, run_id: &str, phase_id: usize, phase: &Phase) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::PhaseEnd {
                run_id: run_id.to_string(),
                phase_id,
                phase: phase.name.clone(),
            });
        } else {
            emit_phase_end(run_id, phase_id, &phase.name);
        }
    }

    fn emit_run_end(&self, run_id: &str, result: &ExecutionResult) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunEnd {
                run_id: run_id.to_string(),
                result: result.clone(),
            });
        } else {
            emit_run_end(run_id, result);
        }
    }
}

impl<'a> ExecutionEngineBuilder<'a> {
    pub fn new(ctx: &'a AppContext, opts: &'a ExecutionOpts) -> Self {
        Self {
            ctx,
            opts,
            renderer: None,
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn maybe_renderer(mut self, renderer: Option<Arc<dyn OutputRendererPlugin>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn build(self) -> ExecutionEngine<'a> {
        ExecutionEngine {
            ctx: self.ctx,
            opts: self.opts,
            renderer: self.renderer,
        }
    }
}

/// Ledger entry for a job whose log or output streams failed underneath it.
fn interrupted_result(job: &Job, layout: &RunLayout, err: &RunnerError) -> JobRunResult {
    JobRunResult {
        job_name: job.name.clone(),
        outcome: Outcome::Failure,
        exit: None,
        duration_ms: 0,
        log_path: layout.log_path(&job.name),
        output_tail: String::new(),
        bytes_logged: 0,
        diagnostic: Some(format!("orchestrator error: {err}")),
    }
}

/// Execute a plan with the default engine (no renderer, tracing output).
pub async fn execute_plan(
    ctx: &AppContext,
    opts: &ExecutionOpts,
    plan: &PhasePlan,
) -> Result<ExecutionResult, ExecutorError> {
    ExecutionEngine::new(ctx, opts).execute(plan).await
}
