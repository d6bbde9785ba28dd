//! Answer batch validation
//!
//! Runs before the planner is called. A rejected batch changes nothing.

use tracing::debug;

use crate::wizard::{Answers, Question};

/// A rejected answer batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerValidation {
    /// Offending question ids, sorted
    pub missing: Vec<String>,
    pub message: String,
}

/// Check a submitted batch against the pending questions
///
/// Rejected when the batch is empty, when any submitted answer is blank, or
/// when a required pending question has no answer.
pub fn validate_answers(pending: &[Question], submitted: &Answers) -> Result<(), AnswerValidation> {
    debug!(pending = pending.len(), submitted = submitted.len(), "validate_answers: called");

    if submitted.is_empty() {
        debug!("validate_answers: empty batch");
        let mut missing: Vec<String> = pending.iter().filter(|q| q.required).map(|q| q.id.clone()).collect();
        missing.sort();
        return Err(AnswerValidation {
            missing,
            message: "No answers provided. Please answer the questions to continue.".to_string(),
        });
    }

    let mut missing: Vec<String> = submitted
        .iter()
        .filter(|(_, answer)| answer.trim().is_empty())
        .map(|(id, _)| id.clone())
        .collect();

    for question in pending.iter().filter(|q| q.required) {
        if !submitted.contains_key(&question.id) {
            missing.push(question.id.clone());
        }
    }

    if missing.is_empty() {
        debug!("validate_answers: ok");
        return Ok(());
    }

    missing.sort();
    missing.dedup();
    debug!(?missing, "validate_answers: rejected");
    Err(AnswerValidation {
        message: format!("Please answer all questions. Missing answers for: {}", missing.join(", ")),
        missing,
    })
}
