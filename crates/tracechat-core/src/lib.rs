//! Domain core of the tracechat client: transcript model, SSE frame
//! processing, and the backend traits the controller is written against.

pub mod backend;
pub mod config;
pub mod error;
pub mod stream;
pub mod transcript;

// Re-export common error type
pub use error::TraceChatError;

pub use backend::{ChatBackend, ChatRequest, ChatResponse, FrameStream, TraceQueryService};
pub use config::{ClientConfig, Selectors};
