//! Interactive REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracechat_application::{ChatController, SubmitOutcome};
use tracechat_core::backend::{ChatBackend, TraceQueryService};
use tracechat_core::config::Selectors;

use super::ask::{report_outcome, run_submitted};
use super::query;
use super::render::format_link;

const COMMANDS: &[&str] = &[
    "/project", "/env", "/domain", "/selectors", "/trace", "/logs", "/files", "/clear", "/help",
    "/quit",
];

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Prompt(String),
    Project(String),
    Env(String),
    Domain(String),
    ShowSelectors,
    /// `None` means the current trace of the session.
    Trace(Option<String>),
    Logs(String),
    Files,
    Clear,
    Help,
    Quit,
    Usage(&'static str),
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line == "quit" || line == "exit" {
            return Self::Quit;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Prompt(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg) {
            ("project", "") => Self::Usage("/project <name>"),
            ("project", value) => Self::Project(value.to_string()),
            ("env", "") => Self::Usage("/env <name>"),
            ("env", value) => Self::Env(value.to_string()),
            ("domain", "") => Self::Usage("/domain <name>"),
            ("domain", value) => Self::Domain(value.to_string()),
            ("selectors", _) => Self::ShowSelectors,
            ("trace", "") => Self::Trace(None),
            ("trace", id) => Self::Trace(Some(id.to_string())),
            ("logs", "") => Self::Usage("/logs <query> [key=value ...]"),
            ("logs", rest) => Self::Logs(rest.to_string()),
            ("files", _) => Self::Files,
            ("clear", _) => Self::Clear,
            ("help", _) => Self::Help,
            ("quit", _) | ("exit", _) => Self::Quit,
            _ => Self::Unknown(name.to_string()),
        }
    }
}

/// Completion, highlighting, and hints for slash commands.
#[derive(Clone)]
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates = COMMANDS
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.to_string(),
                    replacement: cmd.to_string(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

pub async fn run<B, Q>(
    controller: &mut ChatController<B>,
    queries: Arc<Q>,
    mut selectors: Selectors,
) -> Result<()>
where
    B: ChatBackend,
    Q: TraceQueryService + ?Sized,
{
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper));

    println!("{}", "=== tracechat ===".bright_magenta().bold());
    print_selectors(&selectors);
    println!(
        "{}",
        "Ask about your logs and traces. '/help' lists commands, Ctrl-C cancels a running analysis."
            .bright_black()
    );
    println!();

    loop {
        let line = match rl.readline("tracechat> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let command = ReplCommand::parse(&line);
        if !matches!(command, ReplCommand::Empty) {
            let _ = rl.add_history_entry(line.as_str());
        }

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            ReplCommand::Prompt(prompt) => {
                if controller.submit(&prompt, &selectors) == SubmitOutcome::Started {
                    let outcome = run_submitted(controller).await;
                    report_outcome(&outcome);
                    println!();
                }
            }
            ReplCommand::Project(value) => {
                selectors.project = value;
                print_selectors(&selectors);
            }
            ReplCommand::Env(value) => {
                selectors.env = value;
                print_selectors(&selectors);
            }
            ReplCommand::Domain(value) => {
                selectors.domain = value;
                print_selectors(&selectors);
            }
            ReplCommand::ShowSelectors => print_selectors(&selectors),
            ReplCommand::Trace(id) => {
                let id = id.or_else(|| controller.current_trace().map(str::to_string));
                match id {
                    Some(id) => report(query::trace(queries.as_ref(), &id).await),
                    None => println!("{}", "No trace in this session yet. Use /trace <id>.".yellow()),
                }
            }
            ReplCommand::Logs(rest) => match query::split_query_tokens(rest.split_whitespace()) {
                Ok((text, filters)) => report(query::logs(queries.as_ref(), &text, &filters).await),
                Err(err) => eprintln!("{}", err.to_string().red()),
            },
            ReplCommand::Files => {
                let mut any = false;
                for link in controller.transcript().all_attachments() {
                    println!("{}", format_link(link));
                    any = true;
                }
                if !any {
                    println!("{}", "No files yet.".bright_black());
                }
            }
            ReplCommand::Clear => {
                controller.clear();
                println!("{}", "Conversation cleared.".bright_black());
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Usage(usage) => println!("{}", format!("Usage: {usage}").yellow()),
            ReplCommand::Unknown(name) => {
                println!("{}", format!("Unknown command '/{name}'. Try /help.").yellow())
            }
        }
    }

    Ok(())
}

fn report(result: Result<()>) {
    if let Err(err) = result {
        eprintln!("{}", format!("{err:#}").red());
    }
}

fn print_selectors(selectors: &Selectors) {
    println!(
        "{}",
        format!(
            "project={} env={} domain={}",
            selectors.project, selectors.env, selectors.domain
        )
        .bright_black()
    );
}

fn print_help() {
    let lines = [
        ("<text>", "ask the assistant"),
        ("/project <name>", "set the project selector"),
        ("/env <name>", "set the environment selector"),
        ("/domain <name>", "set the domain selector"),
        ("/selectors", "show the current selectors"),
        ("/trace [id]", "show trace details (defaults to the last reported trace)"),
        ("/logs <query> [k=v ...]", "search logs"),
        ("/files", "list every download link in this conversation"),
        ("/clear", "clear the conversation"),
        ("/quit", "exit"),
    ];
    for (command, text) in lines {
        println!("  {} {}", format!("{command:<26}").bright_cyan(), text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_prompt() {
        assert_eq!(
            ReplCommand::parse("  show errors for trace 123 "),
            ReplCommand::Prompt("show errors for trace 123".to_string())
        );
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_selector_commands() {
        assert_eq!(
            ReplCommand::parse("/env PROD"),
            ReplCommand::Env("PROD".to_string())
        );
        assert_eq!(
            ReplCommand::parse("/domain  Billing Ops "),
            ReplCommand::Domain("Billing Ops".to_string())
        );
        assert!(matches!(ReplCommand::parse("/project"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_trace_and_logs_commands() {
        assert_eq!(ReplCommand::parse("/trace"), ReplCommand::Trace(None));
        assert_eq!(
            ReplCommand::parse("/trace abc-1"),
            ReplCommand::Trace(Some("abc-1".to_string()))
        );
        assert_eq!(
            ReplCommand::parse("/logs timeout level=error"),
            ReplCommand::Logs("timeout level=error".to_string())
        );
    }

    #[test]
    fn test_quit_and_unknown() {
        assert_eq!(ReplCommand::parse("exit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(
            ReplCommand::parse("/frobnicate now"),
            ReplCommand::Unknown("frobnicate".to_string())
        );
    }
}
