//! PromptWizard - conversational prompt builder
//!
//! CLI entry point for the interactive wizard and one-shot classifiers.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use promptwizard::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use promptwizard::config::Config;
use promptwizard::llm::{Gateway, create_client, is_error_marker, roles};
use promptwizard::prompts::PromptLoader;
use promptwizard::repl;
use promptwizard::wizard::{classify_department, classify_intent};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "PromptWizard loaded config");

    // Fail fast on a missing key rather than at the first model call
    config.validate()?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => repl::run_interactive(&config, None).await,
        Some(Command::Wizard { request }) => {
            debug!(has_request = request.is_some(), "main: matched Wizard command");
            repl::run_interactive(&config, request).await
        }
        Some(Command::Classify { request, format }) => {
            debug!(%format, "main: matched Classify command");
            cmd_classify(&config, &request, format).await
        }
        Some(Command::Intent { request, format }) => {
            debug!(%format, "main: matched Intent command");
            cmd_intent(&config, &request, format).await
        }
        Some(Command::Check) => {
            debug!("main: matched Check command");
            cmd_check(&config).await
        }
    }
}

fn build_gateway(config: &Config) -> Result<Gateway> {
    let client = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
    let prompts = Arc::new(PromptLoader::new(&config.prompts.dir));
    Ok(Gateway::new(client, prompts, config.llm.max_tokens))
}

async fn cmd_classify(config: &Config, request: &str, format: OutputFormat) -> Result<()> {
    debug!(request_len = request.len(), "cmd_classify: called");
    let gateway = build_gateway(config)?;
    let info = classify_department(&gateway, request).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => {
            println!(
                "{} {} ({} confidence)",
                info.department.icon(),
                info.department.to_string().bold(),
                info.confidence
            );
            if !info.rationale.is_empty() {
                println!("  {}", info.rationale);
            }
            if !info.keywords_detected.is_empty() {
                println!("  {} {}", "Keywords:".dimmed(), info.keywords_detected.join(", "));
            }
        }
    }
    Ok(())
}

async fn cmd_intent(config: &Config, request: &str, format: OutputFormat) -> Result<()> {
    debug!(request_len = request.len(), "cmd_intent: called");
    let gateway = build_gateway(config)?;
    let intent = classify_intent(&gateway, request).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&intent)?),
        OutputFormat::Text => {
            println!("{} ({} confidence)", intent.intent_type.to_string().bold(), intent.confidence);
            if !intent.rationale.is_empty() {
                println!("  {}", intent.rationale);
            }
            if intent.intent_type.is_chat() {
                println!("  {}", "Opens a mentor chat".dimmed());
            }
        }
    }
    Ok(())
}

async fn cmd_check(config: &Config) -> Result<()> {
    debug!("cmd_check: called");
    let gateway = build_gateway(config)?;
    let reply = gateway.invoke("Say hello", roles::CONNECTION_TEST).await;

    if is_error_marker(&reply) {
        println!("{} {} {}", "\u{274C}".red(), config.llm.model, reply);
        return Err(eyre::eyre!("Connection check failed"));
    }
    println!("{} Connected to {} ({})", "\u{2705}".green(), config.llm.model, config.llm.base_url);
    Ok(())
}
