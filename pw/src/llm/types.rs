//! LLM request/response types for PromptWizard
//!
//! These types model a single-turn generative call. The Gemini client folds
//! everything into one text part, but the shape stays provider-agnostic.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System framing (role + capabilities preamble)
    pub system_prompt: String,

    /// User messages (always one for wizard calls)
    pub messages: Vec<Message>,

    /// Max tokens for response (from config)
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Flatten framing and messages into the single text part sent upstream
    pub fn to_text(&self) -> String {
        debug!(message_count = %self.messages.len(), "CompletionRequest::to_text: called");
        let mut text = self.system_prompt.clone();
        for msg in &self.messages {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&msg.content);
        }
        text
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Lowercase label used in transcripts
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub finish_reason: FinishReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response, as used by tests and mocks
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other(String),
}

impl FinishReason {
    /// Parse from Gemini API finishReason string
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "FinishReason::from_gemini: called");
        match s {
            "STOP" => {
                debug!("FinishReason::from_gemini: Stop");
                FinishReason::Stop
            }
            "MAX_TOKENS" => {
                debug!("FinishReason::from_gemini: MaxTokens");
                FinishReason::MaxTokens
            }
            "SAFETY" => {
                debug!("FinishReason::from_gemini: Safety");
                FinishReason::Safety
            }
            "RECITATION" => {
                debug!("FinishReason::from_gemini: Recitation");
                FinishReason::Recitation
            }
            other => {
                debug!(%other, "FinishReason::from_gemini: unrecognised");
                FinishReason::Other(other.to_string())
            }
        }
    }
}

/// Token usage reported by the endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
