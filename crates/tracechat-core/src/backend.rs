//! Backend abstractions.
//!
//! The controller only talks to the analysis backend through these traits;
//! `tracechat-infrastructure` provides the HTTP implementation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Selectors;
use crate::error::Result;

/// Raw SSE frames (the text between blank lines) in arrival order.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Body of the request that starts a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub project: String,
    pub env: String,
    pub domain: String,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, selectors: &Selectors) -> Self {
        Self {
            prompt: prompt.into(),
            project: selectors.project.clone(),
            env: selectors.env.clone(),
            domain: selectors.domain.clone(),
        }
    }
}

/// Response of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Path of the live stream, relative to the backend's base address.
    pub stream_url: String,
}

/// Starts turns and opens their event streams.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Posts the chat request and returns the stream location.
    ///
    /// # Errors
    ///
    /// `TraceChatError::Http` for a non-success status,
    /// `TraceChatError::Network` when the backend is unreachable.
    async fn request_stream(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Opens the event stream at `stream_url`.
    async fn open_stream(&self, stream_url: &str) -> Result<FrameStream>;
}

/// Read-only lookups against the trace store.
#[async_trait]
pub trait TraceQueryService: Send + Sync {
    /// Details for one trace id.
    async fn trace_details(&self, trace_id: &str) -> Result<Value>;

    /// Free-text log search with additional `key=value` filters.
    async fn search_logs(&self, query: &str, filters: &[(String, String)]) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::new(
            "show errors for trace 123",
            &Selectors::new("NCC", "PROD", "Transaction"),
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "prompt": "show errors for trace 123",
                "project": "NCC",
                "env": "PROD",
                "domain": "Transaction"
            })
        );
    }

    #[test]
    fn test_response_uses_camel_case() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"streamUrl":"/api/stream/42"}"#).unwrap();
        assert_eq!(response.stream_url, "/api/stream/42");
    }

    #[test]
    fn test_selectors_are_opaque() {
        let request = ChatRequest::new("q", &Selectors::new("ACME", "staging-7", "Billing"));
        assert_eq!(request.project, "ACME");
        assert_eq!(request.env, "staging-7");
        assert_eq!(request.domain, "Billing");
    }
}
