use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::TqConfig;

/// Name of the config file at the workspace root
pub const CONFIG_FILE: &str = "tq.toml";

/// Error type for reading `tq.toml`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse tq.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Find the workspace root by walking up from `start`, looking for a
/// `tq.toml`. Falls back to `start` itself when none is found.
pub fn discover_root(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return current;
        }
        if !current.pop() {
            return start.to_path_buf();
        }
    }
}

/// Load `tq.toml` from `root`. A missing file yields the defaults.
pub fn load_config(root: &Path) -> Result<TqConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(TqConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Directory holding the task documents
pub fn tasks_dir(root: &Path, config: &TqConfig) -> PathBuf {
    root.join(&config.tasks.dir)
}
