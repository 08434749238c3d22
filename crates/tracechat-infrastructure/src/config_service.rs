//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `~/.config/tracechat/config.toml`, writing a
//! default file on first run, and caches the result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracechat_core::config::ClientConfig;
use tracechat_core::error::{Result, TraceChatError};

use crate::paths::TraceChatPaths;

/// Environment variable that overrides `api_base` from the file.
pub const API_BASE_ENV: &str = "TRACECHAT_API_BASE";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file; `None` means the platform default location.
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    ///
    /// Nothing is read until the first [`get_config`](Self::get_config).
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` instead of the default file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it from file if not cached.
    ///
    /// Environment overrides are applied on every load.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let path = self.config_path()?;
        let mut loaded = Self::load_from(&path)?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());
        tracing::debug!(
            "[ConfigService] loaded config from {}: api_base={}",
            path.display(),
            loaded.api_base
        );

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Reads `path`, creating it with defaults if it does not exist.
    ///
    /// A failure to write the default file is logged and otherwise ignored.
    pub fn load_from(path: &Path) -> Result<ClientConfig> {
        if !path.exists() {
            let config = ClientConfig::default();
            if let Err(e) = Self::write_default(path, &config) {
                tracing::warn!(
                    "[ConfigService] could not write default config to {}: {}",
                    path.display(),
                    e
                );
            }
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn write_default(path: &Path, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config).map_err(|e| TraceChatError::Serialization {
            format: "TOML".to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(TraceChatPaths::config_file()?),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
        config.api_base = api_base.trim().to_string();
    }
}
