//! Infrastructure for the tracechat client: the reqwest-backed backend, the
//! SSE byte-stream splitter, and configuration loading.

pub mod config_service;
pub mod http_backend;
pub mod paths;
pub mod sse;

pub use config_service::ConfigService;
pub use http_backend::HttpChatBackend;
pub use paths::{PathError, TraceChatPaths};
pub use sse::{FrameSplitter, frames_from_bytes, unwrap_message};
