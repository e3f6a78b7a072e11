use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collector::{default_categories, ArtifactCategory};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub installer: InstallerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "pipewright_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for orchestrator log files. Job logs live in
    /// `paths.log_dir` regardless of this setting.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Interpreter used for `script = ...` jobs.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Bytes of combined output kept in memory per job for diagnostics.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// Mirror job output to the console in addition to the job log.
    #[serde(default)]
    pub echo_output: bool,

    /// How long to keep reading a job's output after it exits. Anything the
    /// job left running in the background may hold the pipes open past this.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

fn default_drain_grace_ms() -> u64 {
    2_000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            capture_bytes: default_capture_bytes(),
            echo_output: false,
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Parent of every job's private build directory.
    #[serde(default = "default_build_root")]
    pub build_root: String,

    /// Flat directory receiving collected artifacts and the installer.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_build_root() -> String {
    "./build".to_string()
}

fn default_output_dir() -> String {
    "./dist".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            build_root: default_build_root(),
            output_dir: default_output_dir(),
        }
    }
}

impl PathsConfig {
    /// Expand `~` and environment references into concrete paths.
    pub fn layout(&self) -> RunLayout {
        RunLayout {
            log_dir: expand(&self.log_dir),
            build_root: expand(&self.build_root),
            output_dir: expand(&self.output_dir),
        }
    }
}

fn expand(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(s) => PathBuf::from(s.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_categories", rename = "category")]
    pub categories: Vec<ArtifactCategory>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerConfig {
    #[serde(default = "default_script_name")]
    pub script_name: String,

    /// argv prefix; matched artifact paths are appended.
    #[serde(default = "default_install_command")]
    pub install_command: Vec<String>,

    /// Optional post-install check; reported, never fatal.
    #[serde(default)]
    pub verify_command: Option<Vec<String>>,
}

fn default_script_name() -> String {
    "install.sh".to_string()
}

fn default_install_command() -> Vec<String> {
    ["python3", "-m", "pip", "install", "--no-deps", "--force-reinstall"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            script_name: default_script_name(),
            install_command: default_install_command(),
            verify_command: None,
        }
    }
}

/// Resolved on-disk locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub log_dir: PathBuf,
    pub build_root: PathBuf,
    pub output_dir: PathBuf,
}

impl RunLayout {
    pub fn new(
        log_dir: impl Into<PathBuf>,
        build_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            log_dir: log_dir.into(),
            build_root: build_root.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Everything under one root directory, as used by tests and `--workspace`.
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("logs"), root.join("build"), root.join("dist"))
    }

    pub fn log_path(&self, job_name: &str) -> PathBuf {
        self.log_dir.join(format!("{job_name}.log"))
    }

    pub fn build_dir(&self, job_name: &str) -> PathBuf {
        self.build_root.join(job_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.runner.shell, "bash");
        assert_eq!(cfg.paths.output_dir, "./dist");
        assert_eq!(cfg.installer.script_name, "install.sh");
        assert!(cfg.collector.categories.iter().any(|c| c.name == "torch" && c.mandatory));
    }

    #[test]
    fn custom_categories_replace_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[[collector.category]]
name = "numpy"
pattern = "numpy-*-*.whl"
"#,
        )
        .unwrap();
        assert_eq!(cfg.collector.categories.len(), 1);
        assert!(!cfg.collector.categories[0].mandatory);
    }

    #[test]
    fn layout_names_job_paths_deterministically() {
        let layout = RunLayout::new("/l", "/b", "/o");
        assert_eq!(layout.log_path("torch"), PathBuf::from("/l/torch.log"));
        assert_eq!(layout.build_dir("torch"), PathBuf::from("/b/torch"));
    }

    #[test]
    fn layout_expands_home() {
        let paths = PathsConfig {
            log_dir: "~/logs".into(),
            build_root: "/abs/build".into(),
            output_dir: "rel/dist".into(),
        };
        let layout = paths.layout();
        let home_logs = shellexpand::tilde("~/logs").to_string();
        assert_eq!(layout.log_dir, PathBuf::from(home_logs));
        assert_eq!(layout.build_root, PathBuf::from("/abs/build"));
        assert_eq!(layout.output_dir, PathBuf::from("rel/dist"));
    }
}
