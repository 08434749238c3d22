//! One-shot prompt.

use anyhow::{Result, bail};
use colored::Colorize;
use tracechat_application::{ChatController, SubmitOutcome, TurnOutcome};
use tracechat_core::backend::ChatBackend;
use tracechat_core::config::Selectors;

use super::cancel_on_ctrl_c;
use super::render::TurnPrinter;

pub async fn run<B: ChatBackend>(
    controller: &mut ChatController<B>,
    prompt: &str,
    selectors: &Selectors,
) -> Result<()> {
    if controller.submit(prompt, selectors) == SubmitOutcome::Ignored {
        bail!("Nothing to ask: the prompt is empty");
    }

    let outcome = run_submitted(controller).await;
    report_outcome(&outcome);

    match outcome {
        TurnOutcome::RequestFailed(err) | TurnOutcome::TransportFailed(err) => {
            Err(anyhow::Error::new(err))
        }
        _ => Ok(()),
    }
}

/// Runs the already submitted turn, streaming output to stdout. Ctrl-C
/// cancels the turn.
pub async fn run_submitted<B: ChatBackend>(controller: &mut ChatController<B>) -> TurnOutcome {
    let ctrl_c = cancel_on_ctrl_c(controller.cancellation_token());
    let mut printer = TurnPrinter::new();

    let outcome = controller.run_turn(|entry| printer.render(entry)).await;

    ctrl_c.abort();
    outcome
}

pub fn report_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Completed | TurnOutcome::Skipped => {}
        TurnOutcome::Cancelled => println!("{}", "Cancelled.".yellow()),
        TurnOutcome::RequestFailed(err) => {
            let hint = if err.is_retryable() {
                " Please try again."
            } else {
                ""
            };
            eprintln!("{}", format!("Request failed: {err}.{hint}").red());
        }
        TurnOutcome::TransportFailed(err) => {
            println!();
            eprintln!("{}", format!("Stream interrupted: {err}").red());
        }
    }
}
