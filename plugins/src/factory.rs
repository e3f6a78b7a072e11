use std::sync::Arc;

use pipewright_core::config::AppConfig;
use pipewright_core::executor::traits::OutputRendererPlugin;
use pipewright_core::runner::RunnerPlugin;

use crate::executor::{JsonlRendererPlugin, TextRendererPlugin};
use crate::runner::ProcessRunnerPlugin;

pub fn build_runner(_cfg: &AppConfig) -> Arc<dyn RunnerPlugin> {
    Arc::new(ProcessRunnerPlugin::new())
}

/// `None` leaves lifecycle output to tracing.
pub fn build_renderer(stream_format: &str, ascii: bool) -> Option<Arc<dyn OutputRendererPlugin>> {
    match stream_format {
        "jsonl" => Some(Arc::new(JsonlRendererPlugin::new(false))),
        "text" => Some(Arc::new(TextRendererPlugin::new(ascii))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_matches_format() {
        assert_eq!(build_renderer("jsonl", false).unwrap().format(), "jsonl");
        assert_eq!(build_renderer("text", true).unwrap().format(), "text");
        assert!(build_renderer("log", false).is_none());
        assert_eq!(build_runner(&AppConfig::default()).name(), "process");
    }
}
