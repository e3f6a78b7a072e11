//! Job runner: one job in, one `Outcome` and one log file out.

mod io_pump;
mod run;
mod traits;
pub mod types;

pub use io_pump::LogChunk;
pub use run::{run_job, RunJobArgs};
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{ExitReport, JobRunResult, Outcome, RunnerStartArgs};
