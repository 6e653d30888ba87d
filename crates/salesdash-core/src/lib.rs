pub mod error;
pub mod model;

pub use error::*;
pub use model::*;

use std::path::{Path, PathBuf};

/// Environment variable that points directly at a config file
pub const CONFIG_ENV: &str = "SALESDASH_CONFIG";

const CANDIDATES: [&str; 2] = ["salesdash.yaml", ".salesdash.yaml"];

/// Look for a launch config file
///
/// Search order:
/// 1. `SALESDASH_CONFIG` (direct path)
/// 2. current directory: salesdash.yaml, .salesdash.yaml
/// 3. ~/.config/salesdash/config.yaml
///
/// Returns `None` when nothing is found; the launcher then runs on defaults.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!("{} points at a missing file: {}", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("salesdash").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Parse a config file; missing keys fall back to the defaults
pub fn load_config_file(path: &Path) -> Result<LaunchConfig> {
    if !path.exists() {
        return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: LaunchConfig = if content.trim().is_empty() {
        LaunchConfig::default()
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    config.validate()?;
    Ok(config)
}

/// Resolve the effective configuration
///
/// An explicit path must exist. Without one the discovered file is used, and
/// without any file the built-in defaults apply. Returns the file that was read.
pub fn load_config(explicit: Option<&Path>) -> Result<(LaunchConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let config = load_config_file(&path)?;
            Ok((config, Some(path)))
        }
        None => Ok((LaunchConfig::default(), None)),
    }
}
