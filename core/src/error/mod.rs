#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{CliError, CollectError, PlanError, RunnerError};
pub use executor::ExecutorError;
