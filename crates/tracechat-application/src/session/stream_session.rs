//! The live event-stream connection of one turn.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracechat_core::FrameStream;
use tracechat_core::error::TraceChatError;
use tracechat_core::stream::SeenEvents;

/// What [`StreamSession::next_frame`] produced.
#[derive(Debug)]
pub enum SessionFrame {
    /// One raw frame, ready for the event pipeline.
    Frame(String),
    /// The stream failed after it was opened.
    Failed(TraceChatError),
    /// The server closed the stream.
    Ended,
    /// The session's token was cancelled.
    Cancelled,
    /// The session was already closed.
    Closed,
}

/// Owns the frame stream, its cancellation token, and the per-connection
/// dedup memory.
///
/// Closing drops the stream handle, cancels the token, and forgets the seen
/// events. `Drop` closes, so every exit path releases the connection.
pub struct StreamSession {
    stream_url: String,
    frames: Option<FrameStream>,
    token: CancellationToken,
    seen: SeenEvents,
}

impl StreamSession {
    pub fn new(
        stream_url: impl Into<String>,
        frames: FrameStream,
        token: CancellationToken,
        seen_capacity: usize,
    ) -> Self {
        let stream_url = stream_url.into();
        tracing::debug!("[StreamSession] opened {}", stream_url);
        Self {
            stream_url,
            frames: Some(frames),
            token,
            seen: SeenEvents::with_capacity(seen_capacity),
        }
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn is_active(&self) -> bool {
        self.frames.is_some() && !self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn seen(&self) -> &SeenEvents {
        &self.seen
    }

    pub fn seen_mut(&mut self) -> &mut SeenEvents {
        &mut self.seen
    }

    /// Waits for the next frame or for cancellation, whichever comes first.
    ///
    /// Cancellation wins when both are ready.
    pub async fn next_frame(&mut self) -> SessionFrame {
        let Some(frames) = self.frames.as_mut() else {
            return SessionFrame::Closed;
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => SessionFrame::Cancelled,
            item = frames.next() => match item {
                Some(Ok(raw)) => SessionFrame::Frame(raw),
                Some(Err(err)) => SessionFrame::Failed(err),
                None => SessionFrame::Ended,
            },
        }
    }

    /// Releases the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if self.frames.take().is_some() {
            tracing::debug!(
                "[StreamSession] closed {} ({} events seen)",
                self.stream_url,
                self.seen.len()
            );
        }
        self.token.cancel();
        self.seen.clear();
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("stream_url", &self.stream_url)
            .field("active", &self.is_active())
            .field("seen", &self.seen.len())
            .finish()
    }
}
