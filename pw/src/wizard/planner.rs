//! Adaptive Question Planner
//!
//! Asks the model which clarifying questions remain, then normalizes the
//! batch locally. The termination override lives here: once an answer has
//! been recorded, a batch of two or fewer questions completes the dialogue.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use super::WizardError;
use super::analysis::ContextFlags;
use super::department::Department;
use super::pipeline::run_structured;
use crate::llm::{Gateway, roles};

/// Largest batch ever returned, whatever the configuration says
pub const MAX_QUESTIONS: usize = 5;

/// Collected answers keyed by question id
pub type Answers = BTreeMap<String, String>;

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QuestionKind {
    MultipleChoice,
    #[default]
    FreeText,
}

impl From<String> for QuestionKind {
    fn from(value: String) -> Self {
        let value = value.to_lowercase();
        if value.contains("choice") || value.contains("select") {
            Self::MultipleChoice
        } else {
            Self::FreeText
        }
    }
}

/// A clarifying question, never changed once planned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,

    #[serde(alias = "question")]
    pub text: String,

    #[serde(rename = "type", default)]
    pub kind: QuestionKind,

    #[serde(default, deserialize_with = "lenient_options")]
    pub options: Vec<String>,

    #[serde(default = "default_required", deserialize_with = "lenient_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Question {
    pub fn free_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::FreeText,
            options: Vec::new(),
            required: true,
        }
    }

    pub fn multiple_choice(id: impl Into<String>, text: impl Into<String>, options: &[&str]) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: QuestionKind::MultipleChoice,
            options: options.iter().map(|o| o.to_string()).collect(),
            required: true,
        }
    }
}

/// The planner's reading of the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartAnalysis {
    pub information_already_clear: Vec<String>,
    pub critical_gaps: Vec<String>,
    pub inferred_defaults: Vec<String>,
    pub portfolio_focus: bool,
    pub fresher_focus: bool,
    pub career_development: bool,
}

/// One planning round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPlan {
    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(default, deserialize_with = "lenient_percentage")]
    pub progress_percentage: u8,

    #[serde(default)]
    pub next_step: String,

    #[serde(default, deserialize_with = "lenient_complete")]
    pub is_complete: bool,

    #[serde(default)]
    pub smart_analysis: SmartAnalysis,
}

// Accepts 80, 80.0, "80" or "80%"; anything else is 0. Clamped to 0..=100.
fn lenient_percentage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(number.clamp(0.0, 100.0).round() as u8)
}

// null is no options; a lone string is one option; scalars become their text
fn lenient_options<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        other => vec![other],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}

// true, "true", "yes", 1 and friends; None when the value says nothing
fn lenient_flag(value: serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient_flag(serde_json::Value::deserialize(deserializer)?).unwrap_or_else(default_required))
}

fn lenient_complete<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient_flag(serde_json::Value::deserialize(deserializer)?).unwrap_or(false))
}

impl QuestionPlan {
    /// One required free-text question, half way there
    pub fn fallback(flags: &ContextFlags) -> Self {
        debug!("QuestionPlan::fallback: called");
        Self {
            questions: vec![Question::free_text("q1", "What is your primary objective?")],
            progress_percentage: 50,
            next_step: "Gathering essential requirements".to_string(),
            is_complete: false,
            smart_analysis: SmartAnalysis {
                information_already_clear: vec!["Basic intent".to_string()],
                critical_gaps: vec!["Specific objectives".to_string()],
                inferred_defaults: vec!["General approach".to_string()],
                portfolio_focus: flags.portfolio,
                fresher_focus: flags.fresher,
                career_development: flags.portfolio || flags.fresher,
            },
        }
    }

    /// Apply the local rules that the model cannot be trusted with
    ///
    /// - at most `max_questions` (never more than [`MAX_QUESTIONS`]) questions
    /// - ids are non-blank, unique within the batch and never reuse an answered id
    /// - only multiple-choice questions carry options, and they must have some
    /// - a first round always asks something
    /// - with at least one answer recorded, two or fewer questions asked means done
    ///
    /// Questions with blank text still count as asked for the last rule.
    pub fn normalize(self, answers: &Answers, max_questions: usize, flags: &ContextFlags) -> Self {
        debug!(
            question_count = self.questions.len(),
            answer_count = answers.len(),
            %max_questions,
            "QuestionPlan::normalize: called"
        );
        let asked = self.questions.len().min(max_questions.clamp(1, MAX_QUESTIONS));
        let mut plan = self.conform(answers, max_questions, flags);

        if asked <= 2 && !answers.is_empty() {
            debug!(%asked, "QuestionPlan::normalize: enough answers, forcing completion");
            plan.is_complete = true;
            plan.progress_percentage = 100;
        }
        plan
    }

    /// Every rule of [`normalize`](Self::normalize) except the completion override
    fn conform(mut self, answers: &Answers, max_questions: usize, flags: &ContextFlags) -> Self {
        let cap = max_questions.clamp(1, MAX_QUESTIONS);
        if self.questions.len() > cap {
            warn!(count = self.questions.len(), %cap, "QuestionPlan::conform: truncating batch");
            self.questions.truncate(cap);
        }

        self.questions.retain(|q| !q.text.trim().is_empty());

        // Ids already answered in earlier rounds are taken too
        let mut seen: HashSet<String> = answers.keys().cloned().collect();
        for (i, question) in self.questions.iter_mut().enumerate() {
            let id = question.id.trim().to_string();
            if id.is_empty() || seen.contains(&id) {
                let mut n = i + 1;
                while seen.contains(&format!("q{}", n)) {
                    n += 1;
                }
                question.id = format!("q{}", n);
                debug!(id = %question.id, "QuestionPlan::conform: rewrote question id");
            } else {
                question.id = id;
            }
            seen.insert(question.id.clone());

            question.options.retain(|o| !o.trim().is_empty());
            match question.kind {
                QuestionKind::MultipleChoice if question.options.is_empty() => {
                    debug!(id = %question.id, "QuestionPlan::conform: choice without options, downgrading");
                    question.kind = QuestionKind::FreeText;
                }
                QuestionKind::FreeText => question.options.clear(),
                QuestionKind::MultipleChoice => {}
            }
        }

        if self.questions.is_empty() && answers.is_empty() {
            warn!("QuestionPlan::conform: first round without questions, using fallback question");
            let fallback = Self::fallback(flags);
            self.questions = fallback.questions;
            self.is_complete = false;
        }

        self.progress_percentage = self.progress_percentage.min(100);
        self
    }
}

#[derive(Serialize)]
struct PlannerPrompt<'a> {
    request: &'a str,
    department: &'a str,
    answers: String,
    flags: &'a ContextFlags,
    max_questions: usize,
    priorities: Vec<String>,
}

/// Plan the next batch of clarifying questions with one gateway call
pub async fn plan_questions(
    gateway: &Gateway,
    request: &str,
    department: Department,
    answers: &Answers,
    max_questions: usize,
) -> Result<QuestionPlan, WizardError> {
    debug!(%department, answer_count = answers.len(), "plan_questions: called");
    let flags = ContextFlags::from_request(request);
    let answers_json = serde_json::to_string_pretty(answers).unwrap_or_else(|_| "{}".to_string());

    let context = PlannerPrompt {
        request,
        department: department.label(),
        answers: answers_json,
        flags: &flags,
        max_questions: max_questions.clamp(1, MAX_QUESTIONS),
        priorities: Department::ALL
            .iter()
            .map(|d| format!("{}: {}", d.label(), d.question_priorities()))
            .collect(),
    };

    // The override only applies to what the model actually planned
    let plan = match run_structured::<QuestionPlan, _>(gateway, "questions", &context, roles::QUESTION_GENERATOR).await? {
        Some(plan) => plan.normalize(answers, max_questions, &flags),
        None => {
            warn!("plan_questions: using fallback question");
            QuestionPlan::fallback(&flags).conform(answers, max_questions, &flags)
        }
    };

    info!(
        questions = plan.questions.len(),
        progress = plan.progress_percentage,
        complete = plan.is_complete,
        "Questions planned"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn gateway(texts: &[&str]) -> (Gateway, Arc<MockLlmClient>) {
        let client = Arc::new(MockLlmClient::with_texts(texts));
        let gw = Gateway::new(client.clone(), Arc::new(PromptLoader::embedded_only()), 1024);
        (gw, client)
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn plan_json(question_count: usize, progress: u8, complete: bool) -> String {
        let questions: Vec<_> = (1..=question_count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("q{}", i),
                    "question": format!("Question {}?", i),
                    "type": "multiple_choice",
                    "options": ["A", "B"],
                    "required": true
                })
            })
            .collect();
        serde_json::json!({
            "questions": questions,
            "progress_percentage": progress,
            "next_step": "Refining scope",
            "is_complete": complete,
            "smart_analysis": { "information_already_clear": ["goal"] }
        })
        .to_string()
    }

    #[test]
    fn test_question_deserialize_aliases() {
        let q: Question = serde_json::from_str(r#"{"id": "q1", "question": "Budget?", "type": "text"}"#).unwrap();
        assert_eq!(q.text, "Budget?");
        assert_eq!(q.kind, QuestionKind::FreeText);
        assert!(q.required);

        let q: Question =
            serde_json::from_str(r#"{"id": "q2", "text": "Channel?", "type": "single_choice", "options": ["X"]}"#)
                .unwrap();
        assert_eq!(q.kind, QuestionKind::MultipleChoice);
    }

    #[test]
    fn test_lenient_percentage() {
        let plan: QuestionPlan = serde_json::from_str(r#"{"progress_percentage": "75%"}"#).unwrap();
        assert_eq!(plan.progress_percentage, 75);
        let plan: QuestionPlan = serde_json::from_str(r#"{"progress_percentage": 250}"#).unwrap();
        assert_eq!(plan.progress_percentage, 100);
        let plan: QuestionPlan = serde_json::from_str(r#"{"progress_percentage": -5}"#).unwrap();
        assert_eq!(plan.progress_percentage, 0);
    }

    #[test]
    fn test_normalize_rewrites_ids_and_options() {
        let flags = ContextFlags::default();
        let plan = QuestionPlan {
            questions: vec![
                Question {
                    id: "".to_string(),
                    text: "First?".to_string(),
                    kind: QuestionKind::MultipleChoice,
                    options: vec![],
                    required: true,
                },
                Question {
                    id: "dup".to_string(),
                    text: "Second?".to_string(),
                    kind: QuestionKind::FreeText,
                    options: vec!["stray".to_string()],
                    required: false,
                },
                Question {
                    id: "dup".to_string(),
                    text: "Third?".to_string(),
                    kind: QuestionKind::MultipleChoice,
                    options: vec!["A".to_string(), " ".to_string()],
                    required: true,
                },
            ],
            progress_percentage: 30,
            next_step: String::new(),
            is_complete: false,
            smart_analysis: SmartAnalysis::default(),
        }
        .normalize(&Answers::new(), 5, &flags);

        let ids: Vec<_> = plan.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "dup", "q3"]);
        assert_eq!(plan.questions[0].kind, QuestionKind::FreeText);
        assert!(plan.questions[1].options.is_empty());
        assert_eq!(plan.questions[2].options, vec!["A"]);
        assert!(!plan.is_complete);
    }

    #[test]
    fn test_empty_first_round_gets_fallback_question() {
        let flags = ContextFlags::default();
        let plan = QuestionPlan {
            questions: vec![],
            progress_percentage: 100,
            next_step: String::new(),
            is_complete: true,
            smart_analysis: SmartAnalysis::default(),
        }
        .normalize(&Answers::new(), 5, &flags);

        assert_eq!(plan.questions.len(), 1);
        assert_eq!(plan.questions[0].text, "What is your primary objective?");
        assert!(!plan.is_complete);
    }

    #[test]
    fn test_answered_ids_are_not_reused() {
        let plan: QuestionPlan = serde_json::from_str(&plan_json(3, 10, false)).unwrap();
        let plan = plan.normalize(&answers(&[("q1", "a"), ("q2", "b")]), 5, &ContextFlags::default());

        let ids: Vec<_> = plan.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q3", "q4", "q5"]);
    }

    #[tokio::test]
    async fn test_override_two_questions_with_answers_completes() {
        let raw = plan_json(2, 40, false);
        let (gw, _) = gateway(&[&raw]);

        let plan = plan_questions(&gw, "Launch campaign", Department::DigitalMarketing, &answers(&[("q1", "Gen Z")]), 5)
            .await
            .unwrap();

        assert!(plan.is_complete);
        assert_eq!(plan.progress_percentage, 100);
    }

    #[tokio::test]
    async fn test_no_override_without_answers() {
        let raw = plan_json(2, 40, false);
        let (gw, _) = gateway(&[&raw]);

        let plan = plan_questions(&gw, "Launch campaign", Department::DigitalMarketing, &Answers::new(), 5)
            .await
            .unwrap();

        assert!(!plan.is_complete);
        assert_eq!(plan.progress_percentage, 40);
        assert_eq!(plan.questions.len(), 2);
    }

    #[tokio::test]
    async fn test_no_override_with_three_questions() {
        let raw = plan_json(3, 60, false);
        let (gw, _) = gateway(&[&raw]);

        let plan = plan_questions(&gw, "Launch campaign", Department::DigitalMarketing, &answers(&[("q1", "x")]), 5)
            .await
            .unwrap();

        assert!(!plan.is_complete);
        assert_eq!(plan.progress_percentage, 60);
    }

    #[tokio::test]
    async fn test_unparseable_plan_uses_fallback() {
        let (gw, _) = gateway(&["Let me think about which questions to ask..."]);

        let plan = plan_questions(&gw, "Build a portfolio project", Department::AiEngineering, &Answers::new(), 5)
            .await
            .unwrap();

        assert_eq!(plan.questions, vec![Question::free_text("q1", "What is your primary objective?")]);
        assert!(!plan.is_complete);
        assert_eq!(plan.progress_percentage, 50);
        assert!(plan.smart_analysis.portfolio_focus);
    }

    #[tokio::test]
    async fn test_idempotent_completion_fields() {
        let raw = plan_json(1, 20, false);
        let (gw, _) = gateway(&[&raw, &raw]);
        let collected = answers(&[("q1", "B2B buyers")]);

        let first = plan_questions(&gw, "Plan a webinar", Department::DigitalMarketing, &collected, 5)
            .await
            .unwrap();
        let second = plan_questions(&gw, "Plan a webinar", Department::DigitalMarketing, &collected, 5)
            .await
            .unwrap();

        assert_eq!(first.is_complete, second.is_complete);
        assert_eq!(first.progress_percentage, second.progress_percentage);
    }

    #[tokio::test]
    async fn test_instruction_carries_answers_and_flags() {
        let raw = plan_json(3, 10, false);
        let (gw, client) = gateway(&[&raw]);

        plan_questions(
            &gw,
            "I am a fresher building a data engineering portfolio",
            Department::AiEngineering,
            &answers(&[("q1", "Spark & Airflow")]),
            5,
        )
        .await
        .unwrap();

        let sent = &client.request_texts()[0];
        assert!(sent.contains("\"q1\": \"Spark & Airflow\""));
        assert!(sent.contains("Portfolio Project: true"));
        assert!(sent.contains("Data Engineering: true"));
        assert!(sent.contains("Interactive Questioning Specialist"));
    }

    #[tokio::test]
    async fn test_fallback_after_answers_keeps_asking() {
        let collected = answers(&[("q1", "Gen Z")]);

        for replies in [vec!["no json here"], vec![]] {
            let (gw, _) = gateway(&replies);
            let plan = plan_questions(&gw, "Launch campaign", Department::DigitalMarketing, &collected, 5)
                .await
                .unwrap();

            assert!(!plan.is_complete);
            assert_eq!(plan.progress_percentage, 50);
            assert_eq!(plan.questions.len(), 1);
            assert_eq!(plan.questions[0].text, "What is your primary objective?");
            // q1 is already answered
            assert_eq!(plan.questions[0].id, "q2");
        }
    }

    #[test]
    fn test_loosely_typed_fields_are_accepted() {
        let raw = r#"{
            "questions": [
                {"id": "q1", "question": "Audience?", "type": "free_text", "options": null},
                {"id": "q2", "question": "Budget?", "type": "free_text", "required": "true"},
                {"id": "q3", "question": "Channel?", "type": "multiple_choice", "options": "Email", "required": "no"}
            ],
            "progress_percentage": 30,
            "is_complete": "false"
        }"#;

        let plan: QuestionPlan = crate::wizard::parse_json(raw, QuestionPlan::fallback(&ContextFlags::default()));

        assert_eq!(plan.questions.len(), 3);
        assert!(plan.questions[0].options.is_empty());
        assert!(plan.questions[1].required);
        assert_eq!(plan.questions[2].options, vec!["Email"]);
        assert!(!plan.questions[2].required);
        assert!(!plan.is_complete);

        let plan: QuestionPlan = serde_json::from_str(r#"{"is_complete": 1, "questions": [{"question": "X?", "required": null}]}"#).unwrap();
        assert!(plan.is_complete);
        assert!(plan.questions[0].required);
    }

    #[tokio::test]
    async fn test_blank_questions_count_toward_override() {
        let raw = r#"{"questions": [
            {"id": "q2", "question": "Tone?"},
            {"id": "q3", "question": "  "},
            {"id": "q4", "question": "Length?"}
        ], "progress_percentage": 60}"#;
        let (gw, _) = gateway(&[raw]);

        let plan = plan_questions(&gw, "Write a blog post", Department::Content, &answers(&[("q1", "devs")]), 5)
            .await
            .unwrap();

        assert_eq!(plan.questions.len(), 2);
        assert!(!plan.is_complete);
        assert_eq!(plan.progress_percentage, 60);
    }

    proptest! {
        #[test]
        fn prop_batch_never_exceeds_cap(
            count in 0usize..12,
            max_questions in 0usize..10,
            answered in proptest::bool::ANY,
        ) {
            let plan: QuestionPlan = serde_json::from_str(&plan_json(count, 10, false)).unwrap();
            let collected = if answered { answers(&[("q1", "yes")]) } else { Answers::new() };
            let plan = plan.normalize(&collected, max_questions, &ContextFlags::default());

            prop_assert!(plan.questions.len() <= MAX_QUESTIONS);
            prop_assert!(plan.progress_percentage <= 100);
            if !answered {
                prop_assert!(!plan.questions.is_empty());
            }
            if answered && plan.questions.len() <= 2 {
                prop_assert!(plan.is_complete);
                prop_assert_eq!(plan.progress_percentage, 100);
            }
        }
    }
}
