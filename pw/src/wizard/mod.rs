//! Wizard components
//!
//! Each component builds an instruction, makes one gateway call and either
//! parses the reply or falls back to a fixed value. None of them hold state;
//! the session orchestrator threads everything through.

pub mod analysis;
pub mod department;
mod error;
pub mod intent;
pub mod mentor;
pub mod parse;
pub mod pipeline;
pub mod planner;
pub mod synthesizer;

pub use analysis::{ContextFlags, ConversationContext, ExperienceLevel, RequestInsights};
pub use department::{ContextAnalysis, Department, DepartmentInfo, classify_department};
pub use error::WizardError;
pub use intent::{IntentAnalysis, IntentType, classify_intent};
pub use mentor::{ChatTurn, MentorReply, MentorReplyKind, chat_turn, respond};
pub use parse::{extract_json_object, parse_json, try_parse_json};
pub use pipeline::{Confidence, run_classification, run_structured};
pub use planner::{Answers, MAX_QUESTIONS, Question, QuestionKind, QuestionPlan, SmartAnalysis, plan_questions};
pub use synthesizer::synthesize;
