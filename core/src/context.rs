use std::sync::Arc;

use crate::config::{AppConfig, RunLayout};
use crate::runner::RunnerPlugin;

/// Everything a run needs that outlives a single job.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    runner: Arc<dyn RunnerPlugin>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, runner: Arc<dyn RunnerPlugin>) -> Self {
        Self { cfg, runner }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn runner(&self) -> &dyn RunnerPlugin {
        self.runner.as_ref()
    }

    /// Log, build and output directories with `~` and `$VAR` expanded.
    pub fn layout(&self) -> RunLayout {
        self.cfg.paths.layout()
    }
}
