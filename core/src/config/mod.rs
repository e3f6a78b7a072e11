mod load;
mod types;

pub use load::{apply_env_overrides, get_pipewright_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, CollectorConfig, InstallerConfig, LoggingConfig, PathsConfig, RunLayout,
    RunnerConfig,
};
