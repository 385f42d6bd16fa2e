//! XDG Base Directory utilities for configuration files.

use crate::error::RecordError;
use std::path::PathBuf;

const APP_DIR: &str = "skydns-records";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
/// Follows XDG Base Directory Specification
pub fn config_home() -> Result<PathBuf, RecordError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        RecordError::Config(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Get the global config file path
///
/// Returns `$XDG_CONFIG_HOME/skydns-records/config.toml`. The file is optional.
pub fn global_config_path() -> Result<PathBuf, RecordError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_config_lives_under_app_dir() {
        if let Ok(path) = global_config_path() {
            assert!(path.ends_with("skydns-records/config.toml"));
        }
    }
}
