//! Turn lifecycle: submit → request stream → pump frames → finish.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracechat_core::backend::{ChatBackend, ChatRequest};
use tracechat_core::config::{ClientConfig, Selectors};
use tracechat_core::error::TraceChatError;
use tracechat_core::stream::{
    ChatState, EventRouter, FrameDisposition, default_router, process_frame,
};
use tracechat_core::transcript::{
    CONNECTION_FAILED_MESSAGE, LinkFactory, Transcript, TranscriptEntry,
};

use super::stream_session::{SessionFrame, StreamSession};

/// Where the controller is in the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// Waiting for the chat endpoint to return a stream URL.
    Requesting,
    Streaming,
    /// The stream URL request failed; cleanup in progress.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    /// Blank text, or a turn is already running.
    Ignored,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A terminal event arrived.
    Completed,
    /// The stream URL could not be obtained. No assistant placeholder remains.
    RequestFailed(TraceChatError),
    /// The event stream could not be opened, failed, or ended early.
    TransportFailed(TraceChatError),
    Cancelled,
    /// There was no submitted turn to run.
    Skipped,
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn error(&self) -> Option<&TraceChatError> {
        match self {
            Self::RequestFailed(err) | Self::TransportFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Drives chat turns against a [`ChatBackend`].
///
/// The controller owns the transcript and at most one [`StreamSession`].
/// It is driven with `&mut self` from a single task; other tasks interrupt
/// a running turn through [`cancellation_token`](Self::cancellation_token).
pub struct ChatController<B: ChatBackend> {
    backend: Arc<B>,
    router: EventRouter,
    state: ChatState,
    seen_capacity: usize,
    phase: TurnPhase,
    pending: Option<ChatRequest>,
    session: Option<StreamSession>,
    cancel_token: CancellationToken,
}

impl<B: ChatBackend> ChatController<B> {
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        Self {
            backend,
            router: default_router(),
            state: ChatState::new(LinkFactory::new(config.download_endpoint())),
            seen_capacity: config.seen_event_capacity,
            phase: TurnPhase::Idle,
            pending: None,
            session: None,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replaces the built-in event handlers.
    pub fn with_router(mut self, router: EventRouter) -> Self {
        self.router = router;
        self
    }

    pub fn router_mut(&mut self) -> &mut EventRouter {
        &mut self.router
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    /// First trace id reported in the most recent turn that reported any.
    pub fn current_trace(&self) -> Option<&str> {
        self.state.current_trace.as_deref()
    }

    pub fn has_live_session(&self) -> bool {
        self.session.as_ref().is_some_and(StreamSession::is_active)
    }

    /// Token that cancels the current turn. A fresh token is issued by every
    /// [`submit`](Self::submit), so grab it after submitting.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Records the user's message and prepares the request.
    ///
    /// Does nothing unless the controller is idle and `text` has
    /// non-whitespace content.
    pub fn submit(&mut self, text: &str, selectors: &Selectors) -> SubmitOutcome {
        let prompt = text.trim();
        if prompt.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.phase != TurnPhase::Idle {
            tracing::debug!(
                "[ChatController] submit ignored in phase {:?}",
                self.phase
            );
            return SubmitOutcome::Ignored;
        }

        self.close_session();
        self.state.transcript.begin_turn(prompt);
        self.pending = Some(ChatRequest::new(prompt, selectors));
        self.cancel_token = CancellationToken::new();
        self.phase = TurnPhase::Requesting;

        tracing::info!(
            "[ChatController] turn submitted (project={}, env={}, domain={})",
            selectors.project,
            selectors.env,
            selectors.domain
        );
        SubmitOutcome::Started
    }

    /// Runs the submitted turn to its end.
    ///
    /// `observer` sees the active assistant entry after every frame that
    /// reached a handler, and once more when a transport failure puts the
    /// fallback message into an empty entry.
    pub async fn run_turn<F>(&mut self, mut observer: F) -> TurnOutcome
    where
        F: FnMut(&TranscriptEntry),
    {
        let Some(request) = self.pending.take() else {
            return TurnOutcome::Skipped;
        };
        let token = self.cancel_token.clone();
        let backend = Arc::clone(&self.backend);

        let requested = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = backend.request_stream(&request) => Some(result),
        };
        let response = match requested {
            None => return self.finish_cancelled(),
            Some(Err(err)) => return self.fail_request(err),
            Some(Ok(response)) => response,
        };

        // At most one live connection.
        self.close_session();

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = backend.open_stream(&response.stream_url) => Some(result),
        };
        let frames = match opened {
            None => return self.finish_cancelled(),
            Some(Err(err)) => return self.fail_transport(err, &mut observer),
            Some(Ok(frames)) => frames,
        };

        self.session = Some(StreamSession::new(
            response.stream_url,
            frames,
            token,
            self.seen_capacity,
        ));
        self.phase = TurnPhase::Streaming;

        loop {
            let next = match self.session.as_mut() {
                Some(session) => session.next_frame().await,
                None => SessionFrame::Closed,
            };

            match next {
                SessionFrame::Frame(raw) => {
                    let disposition = self.handle_frame(&raw);
                    if let FrameDisposition::Handled(_) = disposition {
                        if let Some(entry) = self.state.transcript.active_assistant() {
                            observer(entry);
                        }
                    }
                    if disposition.is_terminal() {
                        return self.finish_completed();
                    }
                }
                SessionFrame::Failed(err) => return self.fail_transport(err, &mut observer),
                SessionFrame::Ended => {
                    let err = TraceChatError::transport("Event stream closed before completion");
                    return self.fail_transport(err, &mut observer);
                }
                SessionFrame::Cancelled | SessionFrame::Closed => return self.finish_cancelled(),
            }
        }
    }

    /// [`submit`](Self::submit) followed by [`run_turn`](Self::run_turn).
    pub async fn send<F>(&mut self, text: &str, selectors: &Selectors, observer: F) -> TurnOutcome
    where
        F: FnMut(&TranscriptEntry),
    {
        match self.submit(text, selectors) {
            SubmitOutcome::Started => self.run_turn(observer).await,
            SubmitOutcome::Ignored => TurnOutcome::Skipped,
        }
    }

    /// Abandons the current turn without running the terminal handler.
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        self.cancel_token.cancel();
        if self.phase == TurnPhase::Idle && self.session.is_none() {
            return false;
        }
        self.pending = None;
        self.finish_cancelled();
        true
    }

    /// Closes any live session and empties the transcript.
    pub fn clear(&mut self) {
        self.cancel();
        self.state.reset();
        tracing::debug!("[ChatController] transcript cleared");
    }

    fn handle_frame(&mut self, raw: &str) -> FrameDisposition {
        match self.session.as_mut() {
            Some(session) => {
                process_frame(raw, session.seen_mut(), &self.router, &mut self.state)
            }
            None => FrameDisposition::Duplicate,
        }
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    fn finish_completed(&mut self) -> TurnOutcome {
        self.close_session();
        self.state.transcript.clear_streaming_flags();
        self.phase = TurnPhase::Idle;
        tracing::info!("[ChatController] turn completed");
        TurnOutcome::Completed
    }

    fn fail_request(&mut self, err: TraceChatError) -> TurnOutcome {
        self.phase = TurnPhase::Failed;
        tracing::warn!("[ChatController] stream request failed: {}", err);

        self.state.transcript.retract_empty_placeholder();
        self.state.transcript.clear_streaming_flags();
        self.phase = TurnPhase::Idle;
        TurnOutcome::RequestFailed(err)
    }

    fn fail_transport<F>(&mut self, err: TraceChatError, observer: &mut F) -> TurnOutcome
    where
        F: FnMut(&TranscriptEntry),
    {
        tracing::warn!("[ChatController] event stream failed: {}", err);
        self.close_session();
        self.state.transcript.clear_streaming_flags();
        if self.state.transcript.fill_empty_with(CONNECTION_FAILED_MESSAGE) {
            if let Some(entry) = self.state.transcript.active_assistant() {
                observer(entry);
            }
        }
        self.phase = TurnPhase::Idle;
        TurnOutcome::TransportFailed(err)
    }

    fn finish_cancelled(&mut self) -> TurnOutcome {
        self.close_session();
        self.state.transcript.clear_streaming_flags();
        self.state.transcript.retract_empty_placeholder();
        self.phase = TurnPhase::Idle;
        tracing::info!("[ChatController] turn cancelled");
        TurnOutcome::Cancelled
    }
}

impl<B: ChatBackend> Drop for ChatController<B> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.close_session();
    }
}

impl<B: ChatBackend> std::fmt::Debug for ChatController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("phase", &self.phase)
            .field("entries", &self.state.transcript.len())
            .field("session", &self.session)
            .finish()
    }
}
