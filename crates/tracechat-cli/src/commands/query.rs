//! One-shot trace and log lookups.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::Value;
use tracechat_core::backend::TraceQueryService;

/// Splits `key=value`. Both sides are trimmed; an empty key is rejected.
pub fn parse_filter(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("filter '{raw}' must look like key=value");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("filter '{raw}' has an empty key");
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Separates `key=value` tokens from free-text query words.
pub fn split_query_tokens<'a, I>(tokens: I) -> Result<(String, Vec<(String, String)>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut words = Vec::new();
    let mut filters = Vec::new();
    for token in tokens {
        if token.contains('=') {
            filters.push(parse_filter(token)?);
        } else {
            words.push(token);
        }
    }
    Ok((words.join(" "), filters))
}

pub async fn trace<S: TraceQueryService + ?Sized>(service: &S, trace_id: &str) -> Result<()> {
    let details = service
        .trace_details(trace_id)
        .await
        .with_context(|| format!("Failed to load trace {trace_id}"))?;
    println!("{}", format!("Trace {trace_id}").bright_magenta().bold());
    print_json(&details)
}

pub async fn logs<S: TraceQueryService + ?Sized>(
    service: &S,
    query: &str,
    filters: &[(String, String)],
) -> Result<()> {
    let results = service
        .search_logs(query, filters)
        .await
        .context("Log search failed")?;
    print_json(&results)
}

fn print_json(value: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    for line in pretty.lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter(" service = checkout ").unwrap(),
            ("service".to_string(), "checkout".to_string())
        );
        assert_eq!(
            parse_filter("path=/a=b").unwrap(),
            ("path".to_string(), "/a=b".to_string())
        );
        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_split_query_tokens() {
        let (query, filters) =
            split_query_tokens("timeout errors level=error host=web-1".split_whitespace()).unwrap();

        assert_eq!(query, "timeout errors");
        assert_eq!(
            filters,
            vec![
                ("level".to_string(), "error".to_string()),
                ("host".to_string(), "web-1".to_string()),
            ]
        );
    }
}
