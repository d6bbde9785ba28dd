//! Wizard error types

use thiserror::Error;

/// Errors raised by the session orchestrator
///
/// Gateway and parse failures never appear here: they degrade into fallback
/// values. Answer validation failures are a turn outcome, not an error.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{operation} is not valid while the session is {state}")]
    InvalidTransition { operation: &'static str, state: String },

    #[error("Chat message is empty")]
    EmptyMessage,

    #[error("Prompt template error: {0}")]
    Prompt(String),
}

impl From<eyre::Report> for WizardError {
    fn from(err: eyre::Report) -> Self {
        Self::Prompt(err.to_string())
    }
}
