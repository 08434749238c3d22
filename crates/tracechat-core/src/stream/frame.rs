//! SSE frame parsing.

/// One parsed wire frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFrame {
    /// Value of the `event` line; empty when the frame had none.
    pub event: String,
    /// Concatenation of every `data` line value, without separators.
    pub data: String,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Composite key used by the dedup filter.
    pub fn key(&self) -> String {
        format!("{}-{}", self.event, self.data)
    }
}

/// Parses one raw frame of `key: value` lines.
///
/// Total over any input: unknown keys, comments and lines without a colon
/// are skipped, and missing fields default to empty strings.
pub fn parse_frame(raw: &str) -> EventFrame {
    let mut frame = EventFrame::default();

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match key.trim() {
            "event" => frame.event = value.trim_end().to_string(),
            "data" => frame.data.push_str(value),
            _ => {}
        }
    }

    frame
}
