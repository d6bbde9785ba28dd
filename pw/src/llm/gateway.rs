//! LLM Gateway
//!
//! The one boundary every wizard component talks through. It wraps an
//! instruction in role framing, makes exactly one call, and always hands
//! back text: either the completion or an `Error: ...` marker.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{CompletionRequest, LlmClient, Message};
use crate::prompts::PromptLoader;

/// Prefix of every failure string the gateway produces
pub const ERROR_MARKER: &str = "Error:";

/// Role labels injected into the framing for each component
pub mod roles {
    pub const INTENT_ANALYZER: &str = "Input Intent Analyzer";
    pub const DEPARTMENT_DETECTOR: &str = "Department Detection Specialist";
    pub const QUESTION_GENERATOR: &str = "Interactive Questioning Specialist";
    pub const PROMPT_GENERATOR: &str = "Final Prompt Generator";
    pub const MENTOR: &str = "AI Mentor";
    pub const CONNECTION_TEST: &str = "Test";
}

/// True if `text` is a gateway failure rather than model output
pub fn is_error_marker(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

/// Sends role-framed instructions and returns raw text, never an error
pub struct Gateway {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl Gateway {
    pub fn new(client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        debug!(%max_tokens, "Gateway::new: called");
        Self {
            client,
            prompts,
            max_tokens,
        }
    }

    /// Prompt templates shared with the components built on this gateway
    pub fn prompts(&self) -> &PromptLoader {
        &self.prompts
    }

    /// Invoke the model once with `instruction` framed for `role`
    ///
    /// Network failures, non-success statuses, malformed envelopes and
    /// timeouts all come back as a string starting with [`ERROR_MARKER`].
    pub async fn invoke(&self, instruction: &str, role: &str) -> String {
        debug!(%role, instruction_len = instruction.len(), "Gateway::invoke: called");
        let framing = self.prompts.frame(role).unwrap_or_else(|e| {
            warn!(error = %e, "Gateway::invoke: frame template failed, using bare framing");
            format!("You are an advanced {}.", role)
        });

        let request = CompletionRequest {
            system_prompt: framing,
            messages: vec![Message::user(instruction)],
            max_tokens: self.max_tokens,
        };

        match self.client.complete(request).await {
            Ok(response) => match response.content {
                Some(text) => {
                    debug!(text_len = text.len(), ?response.finish_reason, "Gateway::invoke: success");
                    text
                }
                None => {
                    warn!(%role, "Gateway::invoke: response carried no text");
                    format!("{} empty response from model", ERROR_MARKER)
                }
            },
            Err(e) => {
                warn!(%role, error = %e, "Gateway::invoke: call failed");
                format!("{} {}", ERROR_MARKER, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, FinishReason, TokenUsage};

    fn gateway(client: Arc<MockLlmClient>) -> Gateway {
        Gateway::new(client, Arc::new(PromptLoader::embedded_only()), 1024)
    }

    #[tokio::test]
    async fn test_invoke_returns_raw_text_and_frames_role() {
        let client = Arc::new(MockLlmClient::with_texts(&["hello back"]));
        let gw = gateway(client.clone());

        let text = gw.invoke("Say hello", roles::CONNECTION_TEST).await;

        assert_eq!(text, "hello back");
        let sent = client.request_texts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("You are an advanced Test"));
        assert!(sent[0].ends_with("Say hello"));
    }

    #[tokio::test]
    async fn test_invoke_failure_becomes_error_marker() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let gw = gateway(client.clone());

        let text = gw.invoke("anything", roles::MENTOR).await;

        assert!(is_error_marker(&text), "got: {}", text);
        assert!(text.contains("No more mock responses"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invoke_empty_content_is_error_marker() {
        let client = Arc::new(MockLlmClient::new(vec![CompletionResponse {
            content: None,
            finish_reason: FinishReason::Safety,
            usage: TokenUsage::default(),
        }]));
        let gw = gateway(client);

        let text = gw.invoke("anything", roles::MENTOR).await;
        assert!(is_error_marker(&text));
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("Error: API returned status 500"));
        assert!(!is_error_marker("{\"intent_type\": \"question\"}"));
        assert!(!is_error_marker("An Error: occurred mid-text"));
    }
}
