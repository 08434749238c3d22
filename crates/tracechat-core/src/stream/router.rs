//! Event-name to handler registry.

use std::collections::HashMap;

use super::state::{ChatState, StreamEvent};

/// What the controller should do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Keep reading frames.
    Continue,
    /// The turn is over; close the connection.
    Terminal,
}

/// A transcript transform for one event name.
pub type EventHandler = fn(&mut ChatState, &StreamEvent) -> HandlerOutcome;

/// Maps event names (exact, case-sensitive) to handlers, with a fallback
/// for unmapped names.
#[derive(Clone)]
pub struct EventRouter {
    handlers: HashMap<String, EventHandler>,
    default_handler: EventHandler,
}

impl EventRouter {
    pub fn new(default_handler: EventHandler) -> Self {
        Self {
            handlers: HashMap::new(),
            default_handler,
        }
    }

    /// Registers `handler` for `event`. A later registration for the same
    /// name replaces the earlier one.
    pub fn register(&mut self, event: impl Into<String>, handler: EventHandler) {
        self.handlers.insert(event.into(), handler);
    }

    pub fn set_default(&mut self, handler: EventHandler) {
        self.default_handler = handler;
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Runs the handler registered for `event.name`, or the default one.
    pub fn dispatch(&self, state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
        let handler = self
            .handlers
            .get(event.name.as_str())
            .copied()
            .unwrap_or(self.default_handler);
        handler(state, event)
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("EventRouter").field("events", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::handlers::{self, default_router};
    use crate::transcript::LinkFactory;

    fn streaming_state() -> ChatState {
        let mut state = ChatState::new(LinkFactory::new("/download/"));
        state.transcript.begin_turn("q");
        state
    }

    fn append_first(state: &mut ChatState, _event: &StreamEvent) -> HandlerOutcome {
        state.transcript.append_chunk("first");
        HandlerOutcome::Continue
    }

    fn append_second(state: &mut ChatState, _event: &StreamEvent) -> HandlerOutcome {
        state.transcript.append_chunk("second");
        HandlerOutcome::Continue
    }

    #[test]
    fn test_last_registration_wins() {
        let mut router = EventRouter::new(handlers::append_unknown_event);
        router.register("step", append_first);
        router.register("step", append_second);

        let mut state = streaming_state();
        router.dispatch(&mut state, &StreamEvent::new("step", ""));

        assert_eq!(state.transcript.active_assistant().unwrap().text, "second");
    }

    #[test]
    fn test_unmapped_and_empty_names_use_default() {
        let router = default_router();
        let mut state = streaming_state();

        let outcome = router.dispatch(&mut state, &StreamEvent::new("", "hello"));

        assert_eq!(outcome, HandlerOutcome::Continue);
        assert_eq!(state.transcript.active_assistant().unwrap().text, "\nhello\n\n");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let router = default_router();
        assert!(router.is_registered("done"));
        assert!(!router.is_registered("Done"));

        let mut state = streaming_state();
        let outcome = router.dispatch(&mut state, &StreamEvent::new("Done", "{}"));
        assert_eq!(outcome, HandlerOutcome::Continue);
        assert_eq!(state.transcript.streaming_count(), 1);
    }

    #[test]
    fn test_done_is_terminal() {
        let router = default_router();
        let mut state = streaming_state();
        let outcome = router.dispatch(&mut state, &StreamEvent::new("done", r#"{"status":"complete"}"#));
        assert_eq!(outcome, HandlerOutcome::Terminal);
    }
}
