use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracechat_application::ControllerFactory;
use tracechat_core::config::{ClientConfig, Selectors};
use tracechat_infrastructure::ConfigService;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "tracechat")]
#[command(about = "tracechat - chat with the log and trace analysis assistant", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/tracechat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base address, overriding the config file
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[arg(long, global = true)]
    project: Option<String>,

    #[arg(long, global = true)]
    env: Option<String>,

    #[arg(long, global = true)]
    domain: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Chat,
    /// Ask a single question and stream the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Show the details of one trace
    Trace { id: String },
    /// Search logs
    Logs {
        query: String,
        /// Extra filter, repeatable
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter_arg)]
        filters: Vec<(String, String)>,
    },
}

fn parse_filter_arg(raw: &str) -> Result<(String, String), String> {
    commands::query::parse_filter(raw).map_err(|e| e.to_string())
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config.
    fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
    }

    fn selectors(&self, config: &ClientConfig) -> Selectors {
        let defaults = &config.selectors;
        Selectors::new(
            self.project.clone().unwrap_or_else(|| defaults.project.clone()),
            self.env.clone().unwrap_or_else(|| defaults.env.clone()),
            self.domain.clone().unwrap_or_else(|| defaults.domain.clone()),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{}", format!("Logging disabled: {e:#}").bright_black());
            None
        }
    };

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let mut config = config_service.get_config()?;
    cli.apply_overrides(&mut config);
    let selectors = cli.selectors(&config);
    tracing::info!("[tracechat] backend {}", config.api_base);

    let (mut controller, backend) = ControllerFactory::new(config).http()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&mut controller, backend, selectors).await?,
        Commands::Ask { prompt } => {
            commands::ask::run(&mut controller, &prompt.join(" "), &selectors).await?
        }
        Commands::Trace { id } => commands::query::trace(backend.as_ref(), &id).await?,
        Commands::Logs { query, filters } => {
            commands::query::logs(backend.as_ref(), &query, &filters).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config_selectors() {
        let cli = Cli::parse_from(["tracechat", "--env", "PROD", "--api-base", "http://h:1", "ask", "why", "slow"]);
        let mut config = ClientConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.api_base, "http://h:1");
        assert_eq!(cli.selectors(&config), Selectors::new("NCC", "PROD", "General"));
        assert!(matches!(cli.command, Some(Commands::Ask { ref prompt }) if prompt.join(" ") == "why slow"));
    }

    #[test]
    fn test_logs_filters_parse() {
        let cli = Cli::parse_from([
            "tracechat", "logs", "timeout", "--filter", "level=error", "--filter", "host=web-1",
        ]);
        let Some(Commands::Logs { query, filters }) = cli.command else {
            panic!("expected logs command");
        };
        assert_eq!(query, "timeout");
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[1], ("host".to_string(), "web-1".to_string()));
    }
}
