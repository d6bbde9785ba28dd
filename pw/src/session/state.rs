//! Session value types
//!
//! A `Session` is a plain value. The orchestrator never mutates one in
//! place; every operation hands back a new value.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::llm::Message;
use crate::wizard::{Answers, Department, DepartmentInfo, IntentAnalysis, Question};

/// One entry in the mentor chat log
pub type ChatMessage = Message;

/// Where a session is in the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Created, nothing submitted yet
    Initial,
    /// Request was a bare call for help
    HelpNeeded,
    /// Request too short to work with
    NeedMoreInfo,
    /// Mentor chat in progress
    ChatMode,
    /// Waiting for answers to pending questions
    AwaitingAnswers,
    /// Final prompt produced
    Complete,
    /// Submitted answers were rejected; the session itself stays in AwaitingAnswers
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Initial => "INITIAL",
            Self::HelpNeeded => "HELP_NEEDED",
            Self::NeedMoreInfo => "NEED_MORE_INFO",
            Self::ChatMode => "CHAT_MODE",
            Self::AwaitingAnswers => "AWAITING_ANSWERS",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        };
        write!(f, "{}", label)
    }
}

/// Recap of a completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub department: Department,
    pub original_request: String,
    pub total_questions_answered: usize,
    pub rounds: u32,
    /// Completion came from the round cap rather than the planner
    pub forced: bool,
}

/// In-memory state of one user's interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,

    /// Request as first submitted
    pub original_request: String,

    /// Request used for every call; enriched with the chat transcript after chat
    pub request: String,

    pub state: SessionState,

    pub intent: Option<IntentAnalysis>,

    pub department: Option<DepartmentInfo>,

    /// Every answer collected so far, across rounds
    pub answers: Answers,

    /// Append-only
    pub chat_log: Vec<ChatMessage>,

    pub pending_questions: Vec<Question>,

    /// Completed answer rounds
    pub rounds: u32,

    pub progress: u8,

    pub next_step: String,

    pub final_prompt: Option<String>,

    pub summary: Option<SessionSummary>,
}

impl Session {
    pub fn new(request: &str) -> Self {
        let id = Uuid::now_v7();
        debug!(%id, request_len = request.len(), "Session::new: called");
        Self {
            id,
            original_request: request.to_string(),
            request: request.to_string(),
            state: SessionState::Initial,
            intent: None,
            department: None,
            answers: Answers::new(),
            chat_log: Vec::new(),
            pending_questions: Vec::new(),
            rounds: 0,
            progress: 0,
            next_step: String::new(),
            final_prompt: None,
            summary: None,
        }
    }

    /// Active department, if one has been detected
    pub fn department_label(&self) -> Option<Department> {
        self.department.as_ref().map(|d| d.department)
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }
}
