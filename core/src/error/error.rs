use std::path::PathBuf;

use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("executor failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("artifact collection failed: {0}")]
    Collect(#[from] CollectError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Problems in the plan manifest. Nothing runs when one of these is raised.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("cannot read plan {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid plan manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate job name: {0}")]
    DuplicateJob(String),
    #[error("invalid job name '{0}': must be a plain file name")]
    InvalidJobName(String),
    #[error("job '{0}' declares neither `script` nor `command`")]
    MissingUnit(String),
    #[error("job '{0}' declares both `script` and `command`")]
    AmbiguousUnit(String),
    #[error("job '{0}' has an empty command")]
    EmptyCommand(String),
    #[error("phase name must not be empty")]
    EmptyPhaseName,
}

/// Runner failures that break log isolation. Spawn failures are not errors:
/// they are reported as `Outcome::MissingDefinition`.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("cannot prepare {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("log write failed for {path}: {source}")]
    LogIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("output pump aborted: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("invalid artifact category '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },
    #[error("invalid artifact pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write installer {path}: {source}")]
    Installer {
        path: PathBuf,
        source: std::io::Error,
    },
}
