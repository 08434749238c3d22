//! Client configuration model.
//!
//! Loading and caching live in `tracechat-infrastructure::ConfigService`; this
//! module only describes the shape of `config.toml`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";
pub const DEFAULT_DOWNLOAD_PATH: &str = "/download/";
pub const DEFAULT_SEEN_EVENT_CAPACITY: usize = 512;

/// The project/env/domain triple sent with every chat request.
///
/// Values are opaque to the client; the backend decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_domain")]
    pub domain: String,
}

impl Selectors {
    pub fn new(
        project: impl Into<String>,
        env: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            env: env.into(),
            domain: domain.into(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            project: default_project(),
            env: default_env(),
            domain: default_domain(),
        }
    }
}

fn default_project() -> String {
    "NCC".to_string()
}

fn default_env() -> String {
    "DEV".to_string()
}

fn default_domain() -> String {
    "General".to_string()
}

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the analysis backend, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Path of the endpoint that hands out stream URLs.
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    /// Path of the file download endpoint.
    #[serde(default = "default_download_path")]
    pub download_path: String,
    /// TCP connect timeout for all backend requests.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How many `(event, data)` keys a stream session remembers.
    #[serde(default = "default_seen_event_capacity")]
    pub seen_event_capacity: usize,
    #[serde(default)]
    pub selectors: Selectors,
}

impl ClientConfig {
    /// Joins `api_base` and a path, tolerating a missing or doubled slash.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn chat_endpoint(&self) -> String {
        self.endpoint(&self.chat_path)
    }

    pub fn download_endpoint(&self) -> String {
        self.endpoint(&self.download_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_path: default_chat_path(),
            download_path: default_download_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            seen_event_capacity: default_seen_event_capacity(),
            selectors: Selectors::default(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_download_path() -> String {
    DEFAULT_DOWNLOAD_PATH.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_seen_event_capacity() -> usize {
    DEFAULT_SEEN_EVENT_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            api_base = "https://logs.example.com/"

            [selectors]
            env = "PROD"
            "#,
        )
        .unwrap();

        assert_eq!(config.chat_endpoint(), "https://logs.example.com/api/chat");
        assert_eq!(config.download_endpoint(), "https://logs.example.com/download/");
        assert_eq!(config.selectors.project, "NCC");
        assert_eq!(config.selectors.env, "PROD");
        assert_eq!(config.seen_event_capacity, DEFAULT_SEEN_EVENT_CAPACITY);
    }

    #[test]
    fn test_endpoint_joins_relative_stream_paths() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint("/stream/abc"),
            "http://localhost:8000/stream/abc"
        );
        assert_eq!(
            config.endpoint("stream/abc"),
            "http://localhost:8000/stream/abc"
        );
    }
}
