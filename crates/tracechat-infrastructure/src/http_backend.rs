//! HTTP implementation of the backend traits, built on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracechat_core::backend::{
    ChatBackend, ChatRequest, ChatResponse, FrameStream, TraceQueryService,
};
use tracechat_core::config::ClientConfig;
use tracechat_core::error::{Result, TraceChatError};

use crate::sse::frames_from_bytes;

const TRACE_DETAILS_PATH: &str = "/api/trace/";
const LOG_SEARCH_PATH: &str = "/api/logs";

/// Talks to the analysis backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpChatBackend {
    /// Builds a client with the configured connect timeout.
    ///
    /// No overall request timeout is set: event streams stay open for as
    /// long as the analysis runs.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TraceChatError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for a stream location returned by the chat endpoint.
    pub fn resolve_stream_url(&self, stream_url: &str) -> String {
        if stream_url.starts_with("http://") || stream_url.starts_with("https://") {
            stream_url.to_string()
        } else {
            self.config.endpoint(stream_url)
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| TraceChatError::network(format!("{what} request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::warn!("[HttpChatBackend] {} returned {}", what, status);
            return Err(map_http_error(status, &body_text));
        }

        Ok(response)
    }

    async fn get_json(&self, request: RequestBuilder, what: &str) -> Result<Value> {
        let response = self.send(request, what).await?;
        let value = response.json::<Value>().await?;
        Ok(value)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn request_stream(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.config.chat_endpoint();
        tracing::info!(
            "[HttpChatBackend] POST {} (project={}, env={}, domain={})",
            url,
            request.project,
            request.env,
            request.domain
        );

        let response = self
            .send(self.client.post(&url).json(request), "Chat")
            .await?;
        let parsed: ChatResponse = response.json().await?;

        tracing::debug!("[HttpChatBackend] stream url: {}", parsed.stream_url);
        Ok(parsed)
    }

    async fn open_stream(&self, stream_url: &str) -> Result<FrameStream> {
        let url = self.resolve_stream_url(stream_url);
        tracing::info!("[HttpChatBackend] opening event stream {}", url);

        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache");
        let response = self.send(request, "Event stream").await?;

        Ok(frames_from_bytes(response.bytes_stream()))
    }
}

#[async_trait]
impl TraceQueryService for HttpChatBackend {
    async fn trace_details(&self, trace_id: &str) -> Result<Value> {
        let url = self.config.endpoint(&format!(
            "{TRACE_DETAILS_PATH}{}",
            urlencoding::encode(trace_id.trim())
        ));
        tracing::debug!("[HttpChatBackend] GET {}", url);
        self.get_json(self.client.get(&url), "Trace details").await
    }

    async fn search_logs(&self, query: &str, filters: &[(String, String)]) -> Result<Value> {
        let url = self.config.endpoint(LOG_SEARCH_PATH);
        tracing::debug!(
            "[HttpChatBackend] GET {} (query={:?}, {} filters)",
            url,
            query,
            filters.len()
        );
        let request = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .query(filters);
        self.get_json(request, "Log search").await
    }
}

/// Prefers a `detail`/`message`/`error` field from a JSON error body,
/// falling back to the raw body or the status reason.
fn map_http_error(status: StatusCode, body: &str) -> TraceChatError {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["detail", "message", "error"].iter().find_map(|key| {
            value.get(*key).map(|field| match field {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
    });

    let message = match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    TraceChatError::http(status.as_u16(), message)
}
