//! PromptWizard - conversational prompt builder
//!
//! PromptWizard takes a short, often vague request and walks the user to a
//! structured, department-specific prompt for a large language model.
//!
//! # Core Concepts
//!
//! - **Intent first**: questions and requests for ideas open a mentor chat;
//!   everything else goes straight to question planning
//! - **Seven departments**: every request is routed to one fixed label that
//!   shapes the questions and the final prompt
//! - **Adaptive rounds**: the planner asks at most five questions per round
//!   and decides when it has enough
//! - **Never stuck**: unparseable model output degrades to a fixed fallback
//!
//! # Modules
//!
//! - [`llm`] - Gateway and Gemini client
//! - [`wizard`] - Classifiers, planner, synthesizer and mentor
//! - [`session`] - Session state machine
//! - [`prompts`] - Prompt templates
//! - [`repl`] - Interactive front end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod format;
pub mod llm;
pub mod prompts;
pub mod repl;
pub mod session;
pub mod wizard;

// Re-export commonly used types
pub use config::{Config, HistoryConfig, LlmConfig, PromptsConfig, WizardConfig};
pub use format::{clean_prompt_text, format_prompt_output};
pub use llm::{CompletionRequest, CompletionResponse, Gateway, GeminiClient, LlmClient, LlmError, create_client};
pub use prompts::PromptLoader;
pub use session::{Outcome, Session, SessionState, SessionSummary, Transition, Wizard};
pub use wizard::{
    Answers, Confidence, Department, DepartmentInfo, IntentAnalysis, IntentType, Question, QuestionKind, QuestionPlan,
    WizardError,
};
