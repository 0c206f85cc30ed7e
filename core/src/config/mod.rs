mod load;
mod types;

pub use load::{
    apply_env_overrides, get_data_dir, load_default, load_from_path, CONFIG_ENV, LOG_LEVEL_ENV,
    READ_BUFFER_ENV,
};
pub use types::{AppConfig, LoggingConfig, RunnerConfig, DEFAULT_READ_BUFFER_BYTES};
