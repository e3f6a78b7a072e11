use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default pipewright data directory: ~/.pipewright
pub fn get_pipewright_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".pipewright"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.pipewright/config.toml
    let user_config = get_pipewright_data_dir()?.join("config.toml");

    // Priority 2: ./pipewright.toml
    let local_config = Path::new("pipewright.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    for category in &cfg.collector.categories {
        category.validate()?;
    }
    Ok(cfg)
}

/// Environment variable overrides (highest priority below CLI flags).
///
/// `lookup` is injectable so tests don't have to mutate the process env.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("PIPEWRIGHT_LOG_DIR") {
        cfg.paths.log_dir = v;
    }
    if let Some(v) = non_empty("PIPEWRIGHT_BUILD_ROOT") {
        cfg.paths.build_root = v;
    }
    if let Some(v) = non_empty("PIPEWRIGHT_OUTPUT_DIR") {
        cfg.paths.output_dir = v;
    }
    if let Some(v) = non_empty("PIPEWRIGHT_SHELL") {
        cfg.runner.shell = v;
    }
}
