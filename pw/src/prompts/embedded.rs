//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Role framing wrapped around every gateway call
pub const FRAME: &str = include_str!("../../prompts/frame.pmt");

/// Intent classification instruction
pub const INTENT: &str = include_str!("../../prompts/intent.pmt");

/// Department classification instruction
pub const DEPARTMENT: &str = include_str!("../../prompts/department.pmt");

/// Adaptive question planning instruction
pub const QUESTIONS: &str = include_str!("../../prompts/questions.pmt");

/// Final prompt synthesis instruction
pub const SYNTHESIZE: &str = include_str!("../../prompts/synthesize.pmt");

/// Mentor answer to a question
pub const MENTOR_QUESTION: &str = include_str!("../../prompts/mentor-question.pmt");

/// Mentor ranked suggestions
pub const MENTOR_SUGGESTIONS: &str = include_str!("../../prompts/mentor-suggestions.pmt");

/// Mentor free-form chat turn
pub const MENTOR_CHAT: &str = include_str!("../../prompts/mentor-chat.pmt");

/// Every embedded template name, in registration order
pub const NAMES: &[&str] = &[
    "frame",
    "intent",
    "department",
    "questions",
    "synthesize",
    "mentor-question",
    "mentor-suggestions",
    "mentor-chat",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "frame" => Some(FRAME),
        "intent" => Some(INTENT),
        "department" => Some(DEPARTMENT),
        "questions" => Some(QUESTIONS),
        "synthesize" => Some(SYNTHESIZE),
        "mentor-question" => Some(MENTOR_QUESTION),
        "mentor-suggestions" => Some(MENTOR_SUGGESTIONS),
        "mentor-chat" => Some(MENTOR_CHAT),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}
