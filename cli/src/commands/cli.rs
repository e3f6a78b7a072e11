use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pipewright", version, about = "Phase-ordered build orchestration")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.pipewright/config.toml or ./pipewright.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Directory overrides, applied after config file and environment.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct PathOverrides {
    #[arg(long)]
    pub log_dir: Option<String>,

    #[arg(long)]
    pub build_root: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Plan manifest (TOML).
    #[arg(long)]
    pub plan: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show progress bars (text format only).
    #[arg(long)]
    pub progress: bool,

    #[arg(long)]
    pub verbose: bool,

    /// ASCII-only outcome markers.
    #[arg(long)]
    pub ascii: bool,

    /// Also echo job output to the console.
    #[arg(long)]
    pub echo: bool,

    #[command(flatten)]
    pub paths: PathOverrides,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub plan: PathBuf,

    #[command(flatten)]
    pub paths: PathOverrides,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CollectArgs {
    #[arg(long)]
    pub plan: PathBuf,

    #[arg(long)]
    pub ascii: bool,

    #[command(flatten)]
    pub paths: PathOverrides,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every phase of a plan, then collect artifacts.
    Run(RunArgs),
    /// Validate a plan and print what would run.
    Plan(PlanArgs),
    /// Collect artifacts from existing build directories.
    Collect(CollectArgs),
}
