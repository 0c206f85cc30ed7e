use std::path::{Path, PathBuf};

use super::types::AppConfig;

pub const CONFIG_ENV: &str = "STDIO_BOUNDARY_CONFIG";
pub const LOG_LEVEL_ENV: &str = "STDIO_BOUNDARY_LOG_LEVEL";
pub const READ_BUFFER_ENV: &str = "STDIO_BOUNDARY_READ_BUFFER";

const LOCAL_CONFIG_FILE: &str = "stdio-boundary.toml";

/// Get the default data directory: ~/.stdio-boundary
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".stdio-boundary"))
}

/// Load configuration.
///
/// Priority: `explicit` path (must exist) > `$STDIO_BOUNDARY_CONFIG` >
/// `~/.stdio-boundary/config.toml` > `./stdio-boundary.toml` > defaults.
/// Environment overrides are applied on top of whichever file won.
pub fn load_default(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut cfg = match resolve_config_path(explicit)? {
        Some(path) => load_from_path(&path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    cfg.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read config {} failed: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("parse config {} failed: {e}", path.display()))?;
    Ok(cfg)
}

fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(p) = explicit {
        if !p.exists() {
            anyhow::bail!("config file not found: {}", p.display());
        }
        return Ok(Some(p.to_path_buf()));
    }

    if let Ok(v) = std::env::var(CONFIG_ENV) {
        if !v.trim().is_empty() {
            let p = PathBuf::from(v.trim());
            if !p.exists() {
                anyhow::bail!("{CONFIG_ENV} points to a missing file: {}", p.display());
            }
            return Ok(Some(p));
        }
    }

    // A missing home directory just skips this candidate.
    if let Ok(dir) = get_data_dir() {
        let p = dir.join("config.toml");
        if p.exists() {
            return Ok(Some(p));
        }
    }

    let local = Path::new(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    Ok(None)
}

/// Environment variable overrides (highest priority after CLI flags).
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = get(LOG_LEVEL_ENV) {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }

    if let Some(v) = get(READ_BUFFER_ENV) {
        if !v.trim().is_empty() {
            cfg.runner.read_buffer_bytes = v
                .trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid {READ_BUFFER_ENV}={v}: {e}"))?;
        }
    }

    Ok(())
}
