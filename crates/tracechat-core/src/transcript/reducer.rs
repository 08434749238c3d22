//! Append-only mutations of a [`Transcript`].
//!
//! Event handlers never touch entries directly; they call these operations,
//! which keep the streaming-flag and idempotent-append invariants in one
//! place.

use super::attachment::DownloadLink;
use super::model::{Transcript, TranscriptEntry};

/// Substituted into an assistant entry that never received content before
/// its stream failed.
pub const CONNECTION_FAILED_MESSAGE: &str = "Connection failed. Please try again.";

const BLOCK_SEPARATOR: &str = "\n\n";

impl Transcript {
    /// Starts a turn: the immutable user entry followed by an empty
    /// streaming assistant placeholder.
    pub fn begin_turn(&mut self, prompt: impl Into<String>) {
        // A dangling flag from an earlier turn would break the single
        // streaming entry invariant.
        self.clear_streaming_flags();
        self.entries.push(TranscriptEntry::user(prompt));
        self.entries.push(TranscriptEntry::assistant_placeholder());
    }

    /// Appends `chunk` to the active assistant entry.
    ///
    /// Skipped (returns `false`) when there is no active assistant entry,
    /// when the chunk is blank, or when the entry already contains the
    /// trimmed chunk. A blank-line separator is inserted when the existing
    /// text does not already end in a newline.
    pub fn append_chunk(&mut self, chunk: &str) -> bool {
        let candidate = chunk.trim();
        if candidate.is_empty() {
            return false;
        }
        let Some(entry) = self.active_assistant_mut() else {
            return false;
        };
        if entry.text.contains(candidate) {
            return false;
        }
        if !entry.text.is_empty() && !entry.text.ends_with('\n') {
            entry.text.push_str(BLOCK_SEPARATOR);
        }
        entry.text.push_str(chunk);
        true
    }

    /// Whether the active assistant entry's text contains `needle`.
    pub fn active_text_contains(&self, needle: &str) -> bool {
        self.active_assistant()
            .is_some_and(|entry| entry.text.contains(needle))
    }

    /// Appends links to the active assistant entry's attachments. Returns
    /// how many were attached.
    pub fn attach<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = DownloadLink>,
    {
        let Some(entry) = self.active_assistant_mut() else {
            return 0;
        };
        let before = entry.attachments.len();
        entry.attachments.extend(links);
        entry.attachments.len() - before
    }

    /// Clears `is_streaming` on every entry, not just the last one. Returns
    /// how many flags were cleared.
    pub fn clear_streaming_flags(&mut self) -> usize {
        let mut cleared = 0;
        for entry in self.entries.iter_mut().filter(|entry| entry.is_streaming) {
            entry.is_streaming = false;
            cleared += 1;
        }
        cleared
    }

    /// Removes the trailing assistant entry if nothing has arrived for it.
    pub fn retract_empty_placeholder(&mut self) -> bool {
        let is_empty_placeholder = self
            .active_assistant()
            .is_some_and(|entry| !entry.has_content());
        if is_empty_placeholder {
            self.entries.pop();
        }
        is_empty_placeholder
    }

    /// Gives an empty active assistant entry a fallback text.
    pub fn fill_empty_with(&mut self, message: &str) -> bool {
        match self.active_assistant_mut() {
            Some(entry) if !entry.has_content() => {
                entry.text = message.to_string();
                true
            }
            _ => false,
        }
    }

    /// Drops every entry (session clear).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{LinkCategory, LinkFactory, Origin};

    fn streaming_transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.begin_turn("show errors");
        transcript
    }

    #[test]
    fn test_begin_turn_creates_user_and_placeholder() {
        let transcript = streaming_transcript();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].origin, Origin::User);
        assert_eq!(transcript.entries()[0].text, "show errors");
        assert!(!transcript.entries()[0].is_streaming);
        let placeholder = transcript.active_assistant().unwrap();
        assert!(placeholder.text.is_empty());
        assert!(placeholder.is_streaming);
    }

    #[test]
    fn test_append_chunk_separates_blocks() {
        let mut transcript = streaming_transcript();

        assert!(transcript.append_chunk("Summary text."));
        assert!(transcript.append_chunk("Analysis complete.\n\n"));

        assert_eq!(
            transcript.active_assistant().unwrap().text,
            "Summary text.\n\nAnalysis complete.\n\n"
        );
    }

    #[test]
    fn test_append_chunk_is_idempotent() {
        let mut transcript = streaming_transcript();

        assert!(transcript.append_chunk("Downloaded logs\n\n"));
        assert!(!transcript.append_chunk("Downloaded logs\n\n"));
        assert!(!transcript.append_chunk("  Downloaded logs "));

        assert_eq!(transcript.active_assistant().unwrap().text, "Downloaded logs\n\n");
    }

    #[test]
    fn test_append_chunk_ignores_user_tail() {
        let mut transcript = Transcript::new();
        transcript.entries.push(TranscriptEntry::user("hello"));

        assert!(!transcript.append_chunk("should not land"));
        assert_eq!(transcript.entries()[0].text, "hello");
    }

    #[test]
    fn test_clear_streaming_flags_clears_every_entry() {
        let mut transcript = streaming_transcript();
        transcript.entries[0].is_streaming = true;

        assert_eq!(transcript.clear_streaming_flags(), 2);
        assert_eq!(transcript.streaming_count(), 0);
    }

    #[test]
    fn test_retract_only_empty_placeholder() {
        let mut transcript = streaming_transcript();
        assert!(transcript.retract_empty_placeholder());
        assert_eq!(transcript.len(), 1);

        let mut transcript = streaming_transcript();
        transcript.append_chunk("partial");
        assert!(!transcript.retract_empty_placeholder());
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_attachment_counts_as_content() {
        let mut transcript = streaming_transcript();
        let factory = LinkFactory::new("/download/");
        transcript.attach(factory.link("a/x.txt", LinkCategory::TraceAnalysis));

        assert!(!transcript.retract_empty_placeholder());
        assert!(!transcript.fill_empty_with(CONNECTION_FAILED_MESSAGE));
        assert_eq!(transcript.all_attachments().count(), 1);
    }

    #[test]
    fn test_fill_empty_with_fallback() {
        let mut transcript = streaming_transcript();
        assert!(transcript.fill_empty_with(CONNECTION_FAILED_MESSAGE));
        assert_eq!(
            transcript.active_assistant().unwrap().text,
            CONNECTION_FAILED_MESSAGE
        );
    }
}
