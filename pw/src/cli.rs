//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::LlmConfig;

/// PromptWizard - turn a vague request into a department-specific prompt
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Conversational wizard that turns vague requests into department-specific LLM prompts",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; the interactive wizard when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive wizard
    Wizard {
        /// Opening request (prompted for when omitted)
        request: Option<String>,
    },

    /// Detect the department a request belongs to
    Classify {
        /// Request text
        request: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Classify a request's intent (question, suggestion or direct request)
    Intent {
        /// Request text
        request: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Verify the model endpoint answers
    Check,
}

/// Path of the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptwizard")
        .join("logs")
        .join("promptwizard.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Help footer with the API key status and log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let llm = LlmConfig::default();
    let log_path = get_log_path();

    let mut help = String::new();

    help.push_str("API Key:\n");
    let (icon, status) = if llm.api_key().is_some() {
        debug!("generate_after_help: api key present");
        ("\u{2705}", "set")
    } else {
        debug!("generate_after_help: api key missing");
        ("\u{274C}", "not set")
    };
    help.push_str(&format!("  {} {:<16} {}\n", icon, llm.api_key_env, status));

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", log_path.display()));

    debug!("generate_after_help: returning help text");
    help
}

/// Output format for classification commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    #[default]
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
