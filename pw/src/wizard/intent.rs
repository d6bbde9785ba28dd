//! Intent Classifier
//!
//! Decides whether raw input is a question, a request for suggestions, or a
//! direct request to build a prompt. Anything unclear is a direct request.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::WizardError;
use super::pipeline::{Confidence, run_classification};
use crate::llm::{Gateway, roles};

/// What the user is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum IntentType {
    Question,
    SuggestionRequest,
    #[default]
    DirectRequest,
}

impl From<String> for IntentType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "question" => Self::Question,
            "suggestion_request" | "suggestion" | "suggestions" => Self::SuggestionRequest,
            _ => Self::DirectRequest,
        }
    }
}

impl IntentType {
    /// Questions and suggestion requests go to the mentor chat
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Question | Self::SuggestionRequest)
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Question => write!(f, "question"),
            Self::SuggestionRequest => write!(f, "suggestion_request"),
            Self::DirectRequest => write!(f, "direct_request"),
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent_type: IntentType,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default, alias = "reasoning")]
    pub rationale: String,

    /// The model's own short reply to the user
    #[serde(default)]
    pub response: String,

    #[serde(default)]
    pub follow_up_question: String,

    /// Request restated with inferred context
    #[serde(default)]
    pub context_enhanced: String,

    #[serde(default)]
    pub department_hint: String,
}

impl IntentAnalysis {
    /// Direct request at low confidence, so the user is never stuck
    pub fn fallback(request: &str) -> Self {
        debug!("IntentAnalysis::fallback: called");
        Self {
            intent_type: IntentType::DirectRequest,
            confidence: Confidence::Low,
            rationale: String::new(),
            response: String::new(),
            follow_up_question: String::new(),
            context_enhanced: request.to_string(),
            department_hint: "general".to_string(),
        }
    }
}

/// Classify `request` with one gateway call
pub async fn classify_intent(gateway: &Gateway, request: &str) -> Result<IntentAnalysis, WizardError> {
    debug!(request_len = request.len(), "classify_intent: called");
    let context = serde_json::json!({ "request": request });
    let analysis = run_classification(
        gateway,
        "intent",
        &context,
        roles::INTENT_ANALYZER,
        IntentAnalysis::fallback(request),
    )
    .await?;

    info!(intent = %analysis.intent_type, confidence = %analysis.confidence, "Intent classified");
    Ok(analysis)
}
