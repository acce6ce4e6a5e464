// Run settings
// Loaded from --config, else ~/.config/kbart-filter/config.toml when present

use std::fs;
use std::path::{Path, PathBuf};

use kbart_recon::{ReconConfig, ReconError};
use tracing::debug;

/// Get the default config file path
pub fn config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kbart-filter");
    config_dir.join("config.toml")
}

/// Load settings.
///
/// An explicit path must be readable. The default path is optional: when it
/// does not exist the built-in defaults apply. Returns the file actually
/// used, if any.
pub fn load(explicit: Option<&Path>) -> Result<(ReconConfig, Option<PathBuf>), ReconError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok((ReconConfig::default(), None));
            }
            path
        }
    };

    let contents = fs::read_to_string(&path).map_err(|e| ReconError::file_access(path.display(), e))?;
    let config = ReconConfig::from_toml(&contents)
        .map_err(|e| ReconError::Config(format!("{}: {}", path.display(), strip_prefix(e))))?;
    debug!(path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

fn strip_prefix(err: ReconError) -> String {
    match err {
        ReconError::Config(msg) => msg,
        other => other.to_string(),
    }
}
