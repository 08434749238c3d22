use super::dedup::SeenEvents;
use super::frame::parse_frame;
use super::router::{EventRouter, HandlerOutcome};
use super::state::{ChatState, StreamEvent};

/// Result of feeding one raw frame through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Identical `(event, data)` already handled on this connection.
    Duplicate,
    Handled(HandlerOutcome),
}

impl FrameDisposition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Handled(HandlerOutcome::Terminal))
    }
}

/// Parser → decoder → dedup filter → router, for a single frame.
pub fn process_frame(
    raw: &str,
    seen: &mut SeenEvents,
    router: &EventRouter,
    state: &mut ChatState,
) -> FrameDisposition {
    let frame = parse_frame(raw);
    if !seen.check_and_record(&frame.event, &frame.data) {
        tracing::debug!("[EventRouter] dropping duplicate frame: event={:?}", frame.event);
        return FrameDisposition::Duplicate;
    }

    let event = StreamEvent::new(frame.event, frame.data);
    tracing::trace!("[EventRouter] dispatching event={:?}", event.name);
    FrameDisposition::Handled(router.dispatch(state, &event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::handlers::default_router;
    use crate::transcript::LinkFactory;

    #[test]
    fn test_identical_frames_apply_once() {
        let router = default_router();
        let mut seen = SeenEvents::default();
        let mut state = ChatState::new(LinkFactory::new("/download/"));
        state.transcript.begin_turn("q");

        let raw = "event: Progress\ndata: {\"step\":1}";
        let first = process_frame(raw, &mut seen, &router, &mut state);
        let snapshot = state.transcript.clone();
        let second = process_frame(raw, &mut seen, &router, &mut state);

        assert_eq!(first, FrameDisposition::Handled(HandlerOutcome::Continue));
        assert_eq!(second, FrameDisposition::Duplicate);
        assert_eq!(state.transcript, snapshot);
    }

    #[test]
    fn test_done_frame_is_terminal() {
        let router = default_router();
        let mut seen = SeenEvents::default();
        let mut state = ChatState::new(LinkFactory::new("/download/"));
        state.transcript.begin_turn("q");

        let disposition = process_frame(
            "event: done\ndata: {\"status\":\"complete\"}",
            &mut seen,
            &router,
            &mut state,
        );

        assert!(disposition.is_terminal());
        assert_eq!(state.transcript.streaming_count(), 0);
    }
}
