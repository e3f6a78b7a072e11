//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `pipewright_core::api` instead of reaching into internal modules.

pub use crate::collector::{
    collect_and_install, default_categories, missing_mandatory, render_installer,
    search_roots, search_roots_for_plan, synthesize_installer, Artifact, ArtifactCategory,
    ArtifactCollector, Collection, ReportEntry, RunReport, SearchRoot,
};
pub use crate::config::{
    load_default, load_from_path, AppConfig, CollectorConfig, InstallerConfig, LoggingConfig,
    PathsConfig, RunLayout, RunnerConfig,
};
pub use crate::context::AppContext;
pub use crate::error::{CliError, CollectError, ExecutorError, PlanError, RunnerError};
pub use crate::executor::{
    decide, execute_plan, Decision, ExecutionEngine, ExecutionOpts, ExecutionResult, Ledger,
    OutputRendererPlugin, PhaseOutline, RenderEvent, RunStatus,
};
pub use crate::plan::{load_plan, parse_plan, Criticality, Job, JobUnit, Phase, PhasePlan};
pub use crate::runner::{
    run_job, ExitReport, JobRunResult, Outcome, RunJobArgs, RunnerPlugin, RunnerSession,
    RunnerStartArgs,
};
pub use crate::util::format_duration;
