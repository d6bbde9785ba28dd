//! Prompt Synthesizer
//!
//! Turns the request, department and collected answers into the final prompt.
//! The model's whole reply is the artifact; nothing is parsed.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::WizardError;
use super::analysis::{ContextFlags, RequestInsights};
use super::department::Department;
use super::planner::Answers;
use crate::llm::{Gateway, is_error_marker, roles};

#[derive(Serialize)]
struct SynthesisPrompt<'a> {
    request: &'a str,
    department: &'a str,
    answers: String,
    flags: ContextFlags,
    insights: RequestInsights,
}

/// Produce the final ready-to-use prompt with one gateway call
///
/// A gateway failure is returned as its `Error:` text; the caller decides
/// how to present it.
pub async fn synthesize(
    gateway: &Gateway,
    request: &str,
    department: Department,
    answers: &Answers,
) -> Result<String, WizardError> {
    debug!(%department, answer_count = answers.len(), "synthesize: called");
    let flags = ContextFlags::from_request(request);
    let insights = RequestInsights::derive(request, department, &flags);

    let context = SynthesisPrompt {
        request,
        department: department.label(),
        answers: serde_json::to_string_pretty(answers).unwrap_or_else(|_| "{}".to_string()),
        flags,
        insights,
    };
    let instruction = gateway.prompts().render("synthesize", &context)?;

    let prompt = gateway.invoke(&instruction, roles::PROMPT_GENERATOR).await;
    if is_error_marker(&prompt) {
        warn!(error = %prompt, "synthesize: gateway failed");
    } else {
        info!(prompt_len = prompt.len(), "Final prompt synthesized");
    }
    Ok(prompt)
}
