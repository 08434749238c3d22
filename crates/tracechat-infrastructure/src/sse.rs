//! Splits an SSE byte stream into raw frames.
//!
//! Frames are separated by a blank line. `\r\n` and bare `\r` line endings
//! are normalized to `\n` before splitting, including when a `\r\n` pair is
//! split across two chunks. Frame bytes are decoded as UTF-8 only once the
//! whole frame has arrived, so multi-byte characters may straddle chunks.
//!
//! The chat backend sends each analysis event as the payload of a plain
//! `message` event: its `event:`/`data:` text travels inside the block's
//! `data:` lines. [`frames_from_bytes`] unwraps that envelope the way a
//! browser `EventSource` would, so the pipeline always sees the inner frame.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use tracechat_core::FrameStream;
use tracechat_core::error::TraceChatError;

/// Incremental frame splitter.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: Vec<u8>,
    last_was_cr: bool,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        for &byte in chunk {
            match byte {
                b'\r' => {
                    self.buffer.push(b'\n');
                    self.last_was_cr = true;
                }
                b'\n' if self.last_was_cr => self.last_was_cr = false,
                other => {
                    self.buffer.push(other);
                    self.last_was_cr = false;
                }
            }
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|pair| pair == b"\n\n") {
            let rest = self.buffer.split_off(pos + 2);
            let frame = std::mem::replace(&mut self.buffer, rest);
            if let Some(frame) = decode_frame(&frame[..pos]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let remaining = std::mem::take(&mut self.buffer);
        self.last_was_cr = false;
        decode_frame(&remaining)
    }
}

fn decode_frame(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Turns one wire block into the frame handed to the event pipeline.
///
/// A block with a named `event:` other than `message` (the backend's own
/// `done`, for instance) is already a frame and passes through unchanged.
/// Otherwise the `data:` values are joined with `\n` to recover the frame
/// carried inside. Blocks without data, such as comments or a bare `id:`,
/// yield nothing.
pub fn unwrap_message(block: &str) -> Option<String> {
    let mut event: Option<&str> = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value),
            "data" => data.push(value),
            _ => {}
        }
    }

    match event {
        Some(name) if !name.is_empty() && name != "message" => Some(block.to_string()),
        _ if data.is_empty() => None,
        _ => Some(data.join("\n")),
    }
}

struct SseReaderState<S> {
    inner: Pin<Box<S>>,
    splitter: FrameSplitter,
    pending: VecDeque<String>,
    finished: bool,
}

/// Adapts a chunked byte stream (e.g. `reqwest::Response::bytes_stream`)
/// into a [`FrameStream`] of unwrapped frames (see [`unwrap_message`]).
///
/// A read error is yielded once as `TraceChatError::Transport` and ends the
/// stream.
pub fn frames_from_bytes<S, B, E>(byte_stream: S) -> FrameStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = SseReaderState {
        inner: Box::pin(byte_stream),
        splitter: FrameSplitter::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let frames = state.splitter.push(chunk.as_ref());
                    state
                        .pending
                        .extend(frames.iter().filter_map(|block| unwrap_message(block)));
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((
                        Err(TraceChatError::transport(format!("Stream read error: {e}"))),
                        state,
                    ));
                }
                None => {
                    state.finished = true;
                    let trailing = state.splitter.finish();
                    state
                        .pending
                        .extend(trailing.as_deref().and_then(unwrap_message));
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_blank_lines() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.push(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\nevent: c");

        assert_eq!(frames, vec!["event: a\ndata: 1", "event: b\ndata: 2"]);
        assert_eq!(splitter.finish().as_deref(), Some("event: c"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push(b"event: done\r\ndata: {}\r").is_empty());
        let frames = splitter.push(b"\n\r\n");

        assert_eq!(frames, vec!["event: done\ndata: {}"]);
    }

    #[test]
    fn test_multibyte_character_across_chunks() {
        let text = "data: café\n\n".as_bytes();
        let split = text.len() - 4; // inside the two-byte 'é'
        let mut splitter = FrameSplitter::new();

        assert!(splitter.push(&text[..split]).is_empty());
        assert_eq!(splitter.push(&text[split..]), vec!["data: café"]);
    }

    #[test]
    fn test_keep_alive_blank_frames_are_dropped() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push(b"\n\n\n\n").is_empty());
    }

    #[test]
    fn test_unwrap_message_joins_data_lines() {
        let block = "data: event: Found trace id(s)\ndata: data: {\"count\": 3}";
        assert_eq!(
            unwrap_message(block).as_deref(),
            Some("event: Found trace id(s)\ndata: {\"count\": 3}")
        );
    }

    #[test]
    fn test_unwrap_message_explicit_message_event() {
        let block = "event: message\nid: 7\ndata:event: done\ndata:data: {}";
        assert_eq!(unwrap_message(block).as_deref(), Some("event: done\ndata: {}"));
    }

    #[test]
    fn test_unwrap_message_named_event_passes_through() {
        let block = "event: done\ndata: {\"status\":\"complete\"}";
        assert_eq!(unwrap_message(block).as_deref(), Some(block));
    }

    #[test]
    fn test_unwrap_message_without_data_is_dropped() {
        assert_eq!(unwrap_message(": keep-alive"), None);
        assert_eq!(unwrap_message("id: 4\nretry: 1000"), None);
    }

    #[tokio::test]
    async fn test_frames_from_bytes_stream() {
        let chunks: Vec<Result<&'static [u8], String>> = vec![
            Ok(b"event: Found trace id(s)\nda"),
            Ok(b"ta: {\"count\":1}\n\nevent: done\n"),
            Ok(b"data: {}\n\n"),
        ];

        let frames: Vec<_> = frames_from_bytes(futures::stream::iter(chunks))
            .collect::<Vec<_>>()
            .await;

        assert_eq!(
            frames,
            vec![
                Ok("event: Found trace id(s)\ndata: {\"count\":1}".to_string()),
                Ok("event: done\ndata: {}".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let chunks: Vec<Result<&'static [u8], String>> = vec![
            Ok(b"data: partial\n\n"),
            Err("connection reset".to_string()),
            Ok(b"data: never\n\n"),
        ];

        let frames: Vec<_> = frames_from_bytes(futures::stream::iter(chunks))
            .collect::<Vec<_>>()
            .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Ok("partial".to_string()));
        assert!(matches!(&frames[1], Err(err) if err.is_transport()));
    }
}
