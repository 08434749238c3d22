//! Terminal rendering of streamed assistant entries.

use std::io::Write;

use colored::Colorize;
use tracechat_core::transcript::{DownloadLink, TranscriptEntry};

/// Prints only what changed since the previous observation of an entry.
#[derive(Debug, Default)]
pub struct TurnPrinter {
    entry_id: Option<String>,
    printed_text: String,
    printed_attachments: usize,
}

impl TurnPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints new text and new attachments of `entry`.
    pub fn render(&mut self, entry: &TranscriptEntry) {
        if let Some(delta) = self.text_delta(entry) {
            print!("{}", delta.bright_blue());
        }
        for link in self.new_attachments(entry) {
            println!("{}", format_link(link));
        }
        let _ = std::io::stdout().flush();
    }

    /// Text appended since the last call, or the whole text if the entry
    /// changed identity or was rewritten.
    pub fn text_delta(&mut self, entry: &TranscriptEntry) -> Option<String> {
        if self.entry_id.as_deref() != Some(entry.id.as_str()) {
            self.entry_id = Some(entry.id.clone());
            self.printed_text.clear();
            self.printed_attachments = 0;
        }

        let delta = match entry.text.strip_prefix(self.printed_text.as_str()) {
            Some(rest) => rest.to_string(),
            None => entry.text.clone(),
        };
        self.printed_text = entry.text.clone();

        (!delta.is_empty()).then_some(delta)
    }

    /// Attachments added since the last call. Call after
    /// [`text_delta`](Self::text_delta), which tracks entry identity.
    pub fn new_attachments<'a>(&mut self, entry: &'a TranscriptEntry) -> &'a [DownloadLink] {
        let start = self.printed_attachments.min(entry.attachments.len());
        self.printed_attachments = entry.attachments.len();
        &entry.attachments[start..]
    }
}

pub fn format_link(link: &DownloadLink) -> String {
    format!(
        "  {} {} {}",
        format!("[{}]", link.category).bright_black(),
        link.display_name.bright_green(),
        link.url.underline()
    )
}
