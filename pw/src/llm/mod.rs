//! LLM Client module for PromptWizard
//!
//! Provides the client seam, the Gemini implementation and the text-only
//! gateway the wizard components call.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
pub mod gateway;
mod gemini;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gateway::{ERROR_MARKER, Gateway, is_error_marker, roles};
pub use gemini::GeminiClient;
pub use types::{CompletionRequest, CompletionResponse, FinishReason, Message, Role, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Only "gemini" is supported. A missing API key fails here, at
/// construction, so nothing downstream ever sees it.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "gemini" => {
            debug!("create_client: creating Gemini client");
            Ok(Arc::new(GeminiClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: gemini",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn test_create_client_missing_key_is_fatal() {
        let config = LlmConfig {
            api_key_env: "PROMPTWIZARD_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.is_config());
    }
}
