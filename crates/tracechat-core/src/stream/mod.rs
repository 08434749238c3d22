//! Event-stream processing.
//!
//! Every inbound frame flows `frame` → `payload` → `dedup` → `router`, and the
//! router's handlers mutate a [`ChatState`]. `pipeline::process_frame` wires
//! the stages together for one frame.

pub mod classifier;
mod dedup;
mod frame;
pub mod handlers;
mod payload;
mod pipeline;
mod router;
mod state;

pub use classifier::VerificationReport;
pub use dedup::SeenEvents;
pub use frame::{EventFrame, parse_frame};
pub use handlers::default_router;
pub use payload::Payload;
pub use pipeline::{FrameDisposition, process_frame};
pub use router::{EventHandler, EventRouter, HandlerOutcome};
pub use state::{ChatState, StreamEvent};
