use crate::collector::RunReport;
use crate::executor::types::ExecutionResult;
use crate::plan::Criticality;
use crate::runner::JobRunResult;

/// Output renderer plugin (controls the console format of a run)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }
    fn render(&self, event: &RenderEvent);
}

/// Phase name plus its job names, in declaration order.
pub type PhaseOutline = (String, Vec<String>);

/// Lifecycle events of a run
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_jobs: usize,
        total_phases: usize,
    },
    Plan {
        run_id: String,
        phases: Vec<PhaseOutline>,
    },
    PhaseStart {
        run_id: String,
        phase_id: usize,
        phase: String,
        job_names: Vec<String>,
    },
    JobStart {
        run_id: String,
        job: String,
        phase_id: usize,
        criticality: Criticality,
    },
    JobComplete {
        run_id: String,
        criticality: Criticality,
        result: JobRunResult,
    },
    PhaseEnd {
        run_id: String,
        phase_id: usize,
        phase: String,
    },
    RunEnd {
        run_id: String,
        result: ExecutionResult,
    },
    /// Final summary after artifact collection.
    Report {
        run_id: String,
        report: RunReport,
    },
}
