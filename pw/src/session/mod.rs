//! Session state machine
//!
//! `INITIAL -> HELP_NEEDED | NEED_MORE_INFO | CHAT_MODE | AWAITING_ANSWERS`,
//! `CHAT_MODE -> AWAITING_ANSWERS` on end of chat, and
//! `AWAITING_ANSWERS -> AWAITING_ANSWERS | COMPLETE` per answer round.

mod orchestrator;
mod state;
mod validation;

pub use orchestrator::{HELP_MESSAGE, NEED_MORE_INFO_MESSAGE, Outcome, Transition, Wizard, enrich_request};
pub use state::{ChatMessage, Session, SessionState, SessionSummary};
pub use validation::{AnswerValidation, validate_answers};
