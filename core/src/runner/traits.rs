use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::types::{ExitReport, RunnerStartArgs};

#[async_trait]
pub trait RunnerSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn wait(&mut self) -> anyhow::Result<ExitReport>;
}

/// Spawns job processes. An `Err` from `start_session` means the unit could
/// not be invoked at all.
#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}
