//! Downloadable artifact references.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How an artifact relates to the user's question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkCategory {
    Relevant,
    LessRelevant,
    NotRelevant,
    TraceAnalysis,
    MasterSummary,
    Verification,
    Other,
}

/// A reference to a file held by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    /// Final path segment of the server-supplied path. Never contains a
    /// path separator.
    pub display_name: String,
    /// `<download endpoint>?filename=<urlencoded display_name>`
    pub url: String,
    pub category: LinkCategory,
}

/// Builds [`DownloadLink`]s against one download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFactory {
    download_endpoint: String,
}

impl LinkFactory {
    pub fn new(download_endpoint: impl Into<String>) -> Self {
        Self {
            download_endpoint: download_endpoint.into(),
        }
    }

    pub fn download_endpoint(&self) -> &str {
        &self.download_endpoint
    }

    /// Derives a link from a server path. Returns `None` when the path has
    /// no usable final segment (empty, or ending in a separator).
    pub fn link(&self, path: &str, category: LinkCategory) -> Option<DownloadLink> {
        let display_name = file_name(path)?;
        Some(DownloadLink {
            url: self.url_for(display_name),
            display_name: display_name.to_string(),
            category,
        })
    }

    pub fn url_for(&self, display_name: &str) -> String {
        format!(
            "{}?filename={}",
            self.download_endpoint,
            urlencoding::encode(display_name)
        )
    }
}

/// Last segment of a `/` or `\` separated path, trimmed.
pub fn file_name(path: &str) -> Option<&str> {
    let name = path.rsplit(|c: char| c == '/' || c == '\\').next()?.trim();
    if name.is_empty() { None } else { Some(name) }
}
