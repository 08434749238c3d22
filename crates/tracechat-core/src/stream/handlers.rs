//! Built-in handlers for the analysis backend's event vocabulary.

use serde_json::Value;

use super::classifier::{VerificationReport, classify_summary, verification_text};
use super::payload::{Payload, display_value};
use super::router::{EventRouter, HandlerOutcome};
use super::state::{ChatState, StreamEvent};

pub const EXTRACTED_PARAMETERS: &str = "Extracted Parameters";
pub const DOWNLOADED_LOGS: &str = "Downloaded logs in file";
pub const FOUND_TRACES: &str = "Found trace id(s)";
pub const COMPILED_TRACES: &str = "Compiled Request Traces";
pub const COMPILED_SUMMARY: &str = "Compiled Summary";
pub const VERIFICATION_RESULTS: &str = "Verification Results";
pub const DONE: &str = "done";

pub const ANALYSIS_COMPLETE_MESSAGE: &str = "Analysis complete.";

/// A router with every built-in handler registered.
pub fn default_router() -> EventRouter {
    let mut router = EventRouter::new(append_unknown_event);
    router.register(EXTRACTED_PARAMETERS, append_extracted_parameters);
    router.register(DOWNLOADED_LOGS, append_downloaded_logs);
    router.register(FOUND_TRACES, append_found_traces);
    router.register(COMPILED_TRACES, append_compiled_traces);
    router.register(COMPILED_SUMMARY, attach_summary_files);
    router.register(VERIFICATION_RESULTS, apply_verification_results);
    router.register(DONE, finish_turn);
    router
}

pub fn append_extracted_parameters(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    // One block per turn, regardless of how the payload varies on resend.
    if state.transcript.active_text_contains(EXTRACTED_PARAMETERS) {
        return HandlerOutcome::Continue;
    }

    let params = event.payload.field("parameters");
    let lookup = |key: &str| {
        params
            .and_then(|params| params.get(key))
            .map(display_list)
            .unwrap_or_default()
    };

    let block = format!(
        "{EXTRACTED_PARAMETERS}\nTime frame: {}\nDomain: {}\nQuery keys: {}\n\n",
        lookup("time_frame"),
        lookup("domain"),
        lookup("query_keys"),
    );
    state.transcript.append_chunk(&block);
    HandlerOutcome::Continue
}

pub fn append_downloaded_logs(state: &mut ChatState, _event: &StreamEvent) -> HandlerOutcome {
    state.transcript.append_chunk("Downloaded logs\n\n");
    HandlerOutcome::Continue
}

pub fn append_found_traces(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    let count = event
        .payload
        .field("count")
        .map(display_value)
        .unwrap_or_else(|| "0".to_string());
    state
        .transcript
        .append_chunk(&format!("Found {count} requests\n\n"));

    if let Some(Value::Array(ids)) = event.payload.field("trace_ids") {
        if let Some(first) = ids.first().map(display_value).filter(|id| !id.is_empty()) {
            tracing::debug!("[EventRouter] current trace set to {}", first);
            state.current_trace = Some(first);
        }
    }
    HandlerOutcome::Continue
}

pub fn append_compiled_traces(state: &mut ChatState, _event: &StreamEvent) -> HandlerOutcome {
    state.transcript.append_chunk("Compiled Request Traces\n\n");
    HandlerOutcome::Continue
}

pub fn attach_summary_files(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    let links = classify_summary(&event.payload, &state.links);
    let attached = state.transcript.attach(links);
    tracing::debug!("[EventRouter] attached {} summary files", attached);
    HandlerOutcome::Continue
}

pub fn apply_verification_results(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    let report = VerificationReport::parse(&verification_text(&event.payload));
    state.transcript.append_chunk(&report.summary);
    let attached = state.transcript.attach(report.links(&state.links));
    tracing::debug!("[EventRouter] attached {} verification files", attached);
    HandlerOutcome::Continue
}

pub fn finish_turn(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    let message = done_message(event);
    if !message.trim().is_empty() {
        state.transcript.append_chunk(&format!("{message}\n\n"));
    }
    state.transcript.clear_streaming_flags();
    HandlerOutcome::Terminal
}

pub fn append_unknown_event(state: &mut ChatState, event: &StreamEvent) -> HandlerOutcome {
    let block = format!("{}\n{}\n\n", event.name, event.payload.pretty());
    state.transcript.append_chunk(&block);
    HandlerOutcome::Continue
}

/// `message` if present, the completion literal for `status == "complete"`,
/// otherwise the payload text.
fn done_message(event: &StreamEvent) -> String {
    if let Some(message) = event.payload.field("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if event.payload.field("status").and_then(Value::as_str) == Some("complete") {
        return ANALYSIS_COMPLETE_MESSAGE.to_string();
    }
    match &event.payload {
        Payload::Structured(Value::String(text)) => text.clone(),
        _ => event.raw.clone(),
    }
}

/// Arrays render as a comma-separated list; scalars as plain text.
fn display_list(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => display_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{LinkCategory, LinkFactory};

    fn streaming_state() -> ChatState {
        let mut state = ChatState::new(LinkFactory::new("http://localhost:8000/download/"));
        state.transcript.begin_turn("show errors for trace 123");
        state
    }

    fn text(state: &ChatState) -> &str {
        &state.transcript.active_assistant().unwrap().text
    }

    #[test]
    fn test_extracted_parameters_block() {
        let mut state = streaming_state();
        let event = StreamEvent::new(
            EXTRACTED_PARAMETERS,
            r#"{"parameters":{"time_frame":"last 1h","domain":"Transaction","query_keys":["error","timeout"]}}"#,
        );

        append_extracted_parameters(&mut state, &event);

        assert_eq!(
            text(&state),
            "Extracted Parameters\nTime frame: last 1h\nDomain: Transaction\nQuery keys: error, timeout\n\n"
        );
    }

    #[test]
    fn test_extracted_parameters_only_once_per_turn() {
        let mut state = streaming_state();
        append_extracted_parameters(
            &mut state,
            &StreamEvent::new(EXTRACTED_PARAMETERS, r#"{"parameters":{"query_keys":"a"}}"#),
        );
        append_extracted_parameters(
            &mut state,
            &StreamEvent::new(EXTRACTED_PARAMETERS, r#"{"parameters":{"query_keys":"b"}}"#),
        );

        assert_eq!(text(&state).matches(EXTRACTED_PARAMETERS).count(), 1);
        assert!(text(&state).contains("Query keys: a"));
    }

    #[test]
    fn test_found_traces_records_first_id() {
        let mut state = streaming_state();
        append_found_traces(
            &mut state,
            &StreamEvent::new(FOUND_TRACES, r#"{"count":3,"trace_ids":["t-1","t-2"]}"#),
        );

        assert_eq!(text(&state), "Found 3 requests\n\n");
        assert_eq!(state.current_trace.as_deref(), Some("t-1"));
    }

    #[test]
    fn test_found_traces_without_ids_keeps_trace() {
        let mut state = streaming_state();
        state.current_trace = Some("earlier".into());
        append_found_traces(
            &mut state,
            &StreamEvent::new(FOUND_TRACES, r#"{"count":0,"trace_ids":[]}"#),
        );

        assert_eq!(text(&state), "Found 0 requests\n\n");
        assert_eq!(state.current_trace.as_deref(), Some("earlier"));
    }

    #[test]
    fn test_fixed_literal_handlers() {
        let mut state = streaming_state();
        append_downloaded_logs(&mut state, &StreamEvent::new(DOWNLOADED_LOGS, "/tmp/logs.json"));
        append_compiled_traces(&mut state, &StreamEvent::new(COMPILED_TRACES, "{}"));

        assert_eq!(text(&state), "Downloaded logs\n\nCompiled Request Traces\n\n");
    }

    #[test]
    fn test_compiled_summary_appends_no_text() {
        let mut state = streaming_state();
        attach_summary_files(
            &mut state,
            &StreamEvent::new(
                COMPILED_SUMMARY,
                r#"{"created_files":["a/b/x.txt"],"master_summary_file":"d/z.txt"}"#,
            ),
        );

        let entry = state.transcript.active_assistant().unwrap();
        assert!(entry.text.is_empty());
        assert_eq!(entry.attachments.len(), 2);
        assert_eq!(entry.attachments[1].category, LinkCategory::MasterSummary);
    }

    #[test]
    fn test_verification_results_text_and_links() {
        let mut state = streaming_state();
        let raw = serde_json::to_string(
            "Summary text.\nRelevant files: ['a.txt', 'b.txt']\nLess Relevant Files: []\nNot Relevant Files: ['c.txt']",
        )
        .unwrap();

        apply_verification_results(&mut state, &StreamEvent::new(VERIFICATION_RESULTS, raw));

        let entry = state.transcript.active_assistant().unwrap();
        assert_eq!(entry.text, "Summary text.");
        let names: Vec<_> = entry
            .attachments
            .iter()
            .map(|link| (link.display_name.as_str(), link.category))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.txt", LinkCategory::Relevant),
                ("b.txt", LinkCategory::Relevant),
                ("c.txt", LinkCategory::NotRelevant),
            ]
        );
    }

    #[test]
    fn test_done_with_status_complete() {
        let mut state = streaming_state();
        let outcome = finish_turn(&mut state, &StreamEvent::new(DONE, r#"{"status":"complete"}"#));

        assert_eq!(outcome, HandlerOutcome::Terminal);
        assert_eq!(text(&state), "Analysis complete.\n\n");
        assert_eq!(state.transcript.streaming_count(), 0);
    }

    #[test]
    fn test_done_prefers_message_then_raw() {
        let mut state = streaming_state();
        finish_turn(
            &mut state,
            &StreamEvent::new(DONE, r#"{"message":"All good","status":"complete"}"#),
        );
        assert_eq!(text(&state), "All good\n\n");

        let mut state = streaming_state();
        finish_turn(&mut state, &StreamEvent::new(DONE, "bye"));
        assert_eq!(text(&state), "bye\n\n");
    }

    #[test]
    fn test_unknown_event_is_pretty_printed() {
        let mut state = streaming_state();
        append_unknown_event(&mut state, &StreamEvent::new("Progress", r#"{"step":2}"#));

        assert_eq!(text(&state), "Progress\n{\n  \"step\": 2\n}\n\n");
    }
}
