//! LlmClient trait definition

use async_trait::async_trait;
#[allow(unused_imports)]
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// Each completion request carries its whole context in its text. The wizard
/// keeps conversation state in the session and embeds the transcript in the
/// instruction when it needs it.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete or timed out)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
