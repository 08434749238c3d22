//! Transcript domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attachment::DownloadLink;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unique entry identifier (UUID format)
    pub id: String,
    pub origin: Origin,
    /// Accumulated text. Assistant entries grow while streaming.
    pub text: String,
    /// True only for the in-progress assistant entry.
    pub is_streaming: bool,
    /// Download links attached by classifying events, in arrival order.
    #[serde(default)]
    pub attachments: Vec<DownloadLink>,
    /// Timestamp when the entry was created (ISO 8601 format)
    pub created_at: String,
}

impl TranscriptEntry {
    fn new(origin: Origin, text: String, is_streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            origin,
            text,
            is_streaming,
            attachments: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Origin::User, text.into(), false)
    }

    /// An empty assistant entry waiting for streamed content.
    pub fn assistant_placeholder() -> Self {
        Self::new(Origin::Assistant, String::new(), true)
    }

    pub fn is_assistant(&self) -> bool {
        self.origin == Origin::Assistant
    }

    /// True when no text and no attachments have arrived yet.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || !self.attachments.is_empty()
    }
}

/// The ordered chat history of one session.
///
/// All mutation goes through the reducer operations in
/// [`crate::transcript::reducer`]; the entry list itself is read-only to
/// callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub(crate) entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// The entry incoming events write to: the last entry, if it is an
    /// assistant entry.
    pub fn active_assistant(&self) -> Option<&TranscriptEntry> {
        self.entries.last().filter(|entry| entry.is_assistant())
    }

    pub(crate) fn active_assistant_mut(&mut self) -> Option<&mut TranscriptEntry> {
        self.entries.last_mut().filter(|entry| entry.is_assistant())
    }

    /// Number of entries currently flagged as streaming.
    pub fn streaming_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_streaming).count()
    }

    /// Every attachment across the transcript, in transcript order.
    pub fn all_attachments(&self) -> impl Iterator<Item = &DownloadLink> {
        self.entries.iter().flat_map(|entry| entry.attachments.iter())
    }
}
