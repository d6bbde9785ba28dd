//! Mentor chat
//!
//! Questions and suggestion requests get an advisory reply instead of the
//! question flow. Later turns carry the whole transcript.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::WizardError;
use super::analysis::ConversationContext;
use super::department::Department;
use super::intent::{IntentAnalysis, IntentType};
use super::planner::Answers;
use crate::llm::{Gateway, Message, is_error_marker, roles};

/// Follow-up used when the intent classifier did not suggest one
pub const DEFAULT_QUESTION_FOLLOW_UP: &str = "What specific aspect would you like to focus on?";

/// Follow-up after a list of suggestions
pub const SUGGESTIONS_FOLLOW_UP: &str =
    "Which of these options interests you most, and what specific aspects would you like to explore further?";

/// Which branch produced a mentor reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorReplyKind {
    QuestionResponse,
    SuggestionsResponse,
}

/// Opening mentor reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorReply {
    pub kind: MentorReplyKind,
    pub content: String,
    pub follow_up: String,
    pub context: ConversationContext,
}

#[derive(Serialize)]
struct OpeningPrompt<'a> {
    request: &'a str,
    context: String,
    intent: String,
}

/// Answer a question or offer suggestions with one gateway call
///
/// Only meaningful for chat intents; a direct request is treated as a
/// question.
pub async fn respond(gateway: &Gateway, request: &str, intent: &IntentAnalysis) -> Result<MentorReply, WizardError> {
    debug!(intent = %intent.intent_type, "respond: called");
    let context = ConversationContext::from_request(request);

    let (kind, template, follow_up) = match intent.intent_type {
        IntentType::SuggestionRequest => {
            debug!("respond: suggestions branch");
            (
                MentorReplyKind::SuggestionsResponse,
                "mentor-suggestions",
                SUGGESTIONS_FOLLOW_UP.to_string(),
            )
        }
        IntentType::Question | IntentType::DirectRequest => {
            debug!("respond: question branch");
            let follow_up = if intent.follow_up_question.trim().is_empty() {
                DEFAULT_QUESTION_FOLLOW_UP.to_string()
            } else {
                intent.follow_up_question.trim().to_string()
            };
            (MentorReplyKind::QuestionResponse, "mentor-question", follow_up)
        }
    };

    let prompt = OpeningPrompt {
        request,
        context: context.describe(request, &intent.intent_type.to_string(), &intent.confidence.to_string()),
        intent: serde_json::to_string(intent).unwrap_or_default(),
    };
    let instruction = gateway.prompts().render(template, &prompt)?;

    let content = gateway.invoke(&instruction, roles::MENTOR).await;
    if is_error_marker(&content) {
        warn!(error = %content, "respond: mentor call failed");
    } else {
        info!(?kind, "Mentor replied");
    }

    Ok(MentorReply {
        kind,
        content,
        follow_up,
        context,
    })
}

/// Everything a chat turn can see
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn<'a> {
    pub request: &'a str,
    pub transcript: &'a [Message],
    pub message: &'a str,
    pub department: Option<Department>,
    /// Pretty JSON of collected answers, None when there are none
    pub answers: Option<String>,
    pub final_prompt: Option<&'a str>,
}

impl<'a> ChatTurn<'a> {
    pub fn new(request: &'a str, transcript: &'a [Message], message: &'a str) -> Self {
        Self {
            request,
            transcript,
            message,
            department: None,
            answers: None,
            final_prompt: None,
        }
    }

    pub fn with_department(mut self, department: Option<Department>) -> Self {
        self.department = department;
        self
    }

    pub fn with_answers(mut self, answers: &Answers) -> Self {
        self.answers = if answers.is_empty() {
            None
        } else {
            serde_json::to_string_pretty(answers).ok()
        };
        self
    }

    pub fn with_final_prompt(mut self, final_prompt: Option<&'a str>) -> Self {
        self.final_prompt = final_prompt;
        self
    }
}

/// One free-form chat turn
pub async fn chat_turn(gateway: &Gateway, turn: &ChatTurn<'_>) -> Result<String, WizardError> {
    debug!(transcript_len = turn.transcript.len(), "chat_turn: called");
    let instruction = gateway.prompts().render("mentor-chat", turn)?;
    let reply = gateway.invoke(&instruction, roles::MENTOR).await;
    if is_error_marker(&reply) {
        warn!(error = %reply, "chat_turn: mentor call failed");
    }
    Ok(reply)
}
