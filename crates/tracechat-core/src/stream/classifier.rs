//! Download-link extraction from `Compiled Summary` and
//! `Verification Results` payloads.

use serde_json::Value;

use crate::transcript::{DownloadLink, LinkCategory, LinkFactory};

use super::payload::Payload;

pub const RELEVANT_MARKER: &str = "Relevant files:";
pub const LESS_RELEVANT_MARKER: &str = "Less Relevant Files:";
pub const NOT_RELEVANT_MARKER: &str = "Not Relevant Files:";

/// Links for a `Compiled Summary` payload: every `created_files` entry as
/// `trace_analysis`, then `master_summary_file` as `master_summary`.
pub fn classify_summary(payload: &Payload, links: &LinkFactory) -> Vec<DownloadLink> {
    let mut found = Vec::new();

    if let Some(Value::Array(files)) = payload.field("created_files") {
        found.extend(
            files
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|path| links.link(path, LinkCategory::TraceAnalysis)),
        );
    }

    if let Some(path) = payload.field("master_summary_file").and_then(Value::as_str) {
        found.extend(links.link(path, LinkCategory::MasterSummary));
    }

    found
}

/// A verification report split into its prose summary and the three
/// bracketed file lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub summary: String,
    pub relevant: Vec<String>,
    pub less_relevant: Vec<String>,
    pub not_relevant: Vec<String>,
}

impl VerificationReport {
    /// Tokenizes the report on the three literal markers.
    ///
    /// Each marker is expected to be followed by `[item, item, ...]`. A
    /// missing marker or bracket yields an empty list. Nested brackets and
    /// escaped commas inside names are not understood.
    pub fn parse(report: &str) -> Self {
        let summary = match report.find(RELEVANT_MARKER) {
            Some(index) => &report[..index],
            None => report,
        };

        Self {
            summary: summary.trim().to_string(),
            relevant: file_list_after(report, RELEVANT_MARKER),
            less_relevant: file_list_after(report, LESS_RELEVANT_MARKER),
            not_relevant: file_list_after(report, NOT_RELEVANT_MARKER),
        }
    }

    /// Relevant, then less relevant, then not relevant links.
    pub fn links(&self, links: &LinkFactory) -> Vec<DownloadLink> {
        let groups = [
            (&self.relevant, LinkCategory::Relevant),
            (&self.less_relevant, LinkCategory::LessRelevant),
            (&self.not_relevant, LinkCategory::NotRelevant),
        ];

        groups
            .into_iter()
            .flat_map(|(names, category)| {
                names
                    .iter()
                    .filter_map(move |name| links.link(name, category))
            })
            .collect()
    }
}

/// The report text carried by a `Verification Results` payload.
pub fn verification_text(payload: &Payload) -> String {
    match payload {
        Payload::Structured(Value::Object(object)) => ["report", "result", "message"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| payload.as_text()),
        _ => payload.as_text(),
    }
}

fn file_list_after(report: &str, marker: &str) -> Vec<String> {
    let Some(index) = report.find(marker) else {
        return Vec::new();
    };
    let rest = report[index + marker.len()..].trim_start();
    let Some(body) = rest.strip_prefix('[') else {
        return Vec::new();
    };
    let Some(end) = body.find(']') else {
        return Vec::new();
    };

    body[..end]
        .split(',')
        .map(|item| {
            item.trim()
                .trim_matches(|c: char| c == '\'' || c == '"')
                .trim()
        })
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
