//! Path management for tracechat configuration and logs.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/tracechat/         # Config directory (platform config dir)
//! ├── config.toml              # Client configuration
//! └── logs/                    # Rolling log files
//!     └── tracechat.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "tracechat";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for tracechat_core::TraceChatError {
    fn from(err: PathError) -> Self {
        tracechat_core::TraceChatError::config(err.to_string())
    }
}

pub struct TraceChatPaths;

impl TraceChatPaths {
    /// Returns the tracechat configuration directory (e.g. `~/.config/tracechat/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_config_dir() {
        let Ok(dir) = TraceChatPaths::config_dir() else {
            // No config dir on this platform (e.g. HOME unset); nothing to check.
            return;
        };

        assert!(dir.ends_with("tracechat"));
        assert_eq!(TraceChatPaths::config_file().unwrap(), dir.join("config.toml"));
        assert_eq!(TraceChatPaths::log_dir().unwrap(), dir.join("logs"));
    }
}
