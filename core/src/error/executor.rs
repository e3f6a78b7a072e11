use thiserror::Error;

use super::error::RunnerError;
use crate::executor::ExecutionResult;

/// Executor-specific errors raised while walking the phase plan
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("outcome for job '{0}' was already recorded")]
    DuplicateRecord(String),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    /// The run stopped at `job` because the orchestrator itself failed.
    /// `partial` holds everything recorded up to and including that job.
    #[error("run interrupted at job '{job}': {source}")]
    Interrupted {
        job: String,
        partial: Box<ExecutionResult>,
        source: RunnerError,
    },
}
