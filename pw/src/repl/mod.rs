//! Interactive wizard front end
//!
//! Reads requests and answers from the terminal, drives the session state
//! machine, and prints the final prompt. Slash commands cover the rest.

mod session;

pub use session::ReplSession;

use std::sync::Arc;

use eyre::Result;
use historystore::HistoryStore;
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::{Gateway, create_client};
use crate::prompts::PromptLoader;
use crate::session::Wizard;

/// Run the interactive wizard
///
/// This is the main entry point for `pw` and `pw wizard`.
pub async fn run_interactive(config: &Config, initial_request: Option<String>) -> Result<()> {
    debug!(has_initial = initial_request.is_some(), "run_interactive: called");

    // Missing key or unknown provider fails before the first prompt
    let client = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;
    let prompts = Arc::new(PromptLoader::new(&config.prompts.dir));
    let gateway = Arc::new(Gateway::new(client, prompts, config.llm.max_tokens));
    let wizard = Wizard::new(gateway, config.wizard.clone());

    let history = if config.history.enabled {
        match HistoryStore::open(&config.history.dir) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, dir = %config.history.dir.display(), "History store unavailable");
                None
            }
        }
    } else {
        None
    };

    let mut session = ReplSession::new(wizard, history);
    session.run(initial_request).await
}
