use crate::transcript::{LinkFactory, Transcript};

use super::payload::Payload;

/// Everything an event handler is allowed to change.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub transcript: Transcript,
    /// First trace id reported by the most recent `Found trace id(s)` event.
    pub current_trace: Option<String>,
    pub links: LinkFactory,
}

impl ChatState {
    pub fn new(links: LinkFactory) -> Self {
        Self {
            transcript: Transcript::new(),
            current_trace: None,
            links,
        }
    }

    /// Session clear: empties the transcript and forgets the trace.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.current_trace = None;
    }
}

/// A parsed, decoded frame as handlers see it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub name: String,
    pub payload: Payload,
    pub raw: String,
}

impl StreamEvent {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            name: name.into(),
            payload: Payload::decode(&raw),
            raw,
        }
    }
}
