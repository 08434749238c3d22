//! Transcript domain module.
//!
//! - `model`: chat entries and the ordered transcript
//! - `attachment`: classified download links
//! - `reducer`: the only mutation surface used by event handlers

mod attachment;
mod model;
mod reducer;

pub use attachment::{DownloadLink, LinkCategory, LinkFactory, file_name};
pub use model::{Origin, Transcript, TranscriptEntry};
pub use reducer::CONNECTION_FAILED_MESSAGE;
