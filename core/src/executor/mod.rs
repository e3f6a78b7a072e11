//! Phase scheduler.
//!
//! ```text
//! PhasePlan
//!   ↓
//! ExecutionEngine::execute()
//!   ↓  for each phase, for each job (declaration order)
//! run_job() → Outcome → Ledger::record() → decide()
//!   ↓  Abort on a required job that did not succeed
//! ExecutionResult { status, ledger, job_results }
//! ```

mod engine;
pub mod ledger;
mod output;
mod progress;
pub mod traits;
pub mod types;

pub use engine::{decide, execute_plan, Decision, ExecutionEngine, ExecutionEngineBuilder};
pub use ledger::Ledger;
pub use progress::ProgressMonitor;
pub use traits::{OutputRendererPlugin, PhaseOutline, RenderEvent};
pub use types::{ExecutionOpts, ExecutionResult, RunStatus};
