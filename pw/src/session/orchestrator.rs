//! Session orchestrator
//!
//! Drives a session through intent, mentor chat, department detection,
//! question rounds and synthesis. Every operation takes the current session
//! by reference and returns a new one with the outcome of the turn.
//!
//! Calls for one session are strictly sequential; nothing here spawns.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::state::{ChatMessage, Session, SessionState, SessionSummary};
use super::validation::{AnswerValidation, validate_answers};
use crate::config::WizardConfig;
use crate::llm::Gateway;
use crate::wizard::{
    Answers, ChatTurn, DepartmentInfo, IntentAnalysis, MentorReply, QuestionPlan, WizardError, chat_turn,
    classify_department, classify_intent, plan_questions, respond, synthesize,
};

/// Guidance for a request that is only a call for help
pub const HELP_MESSAGE: &str = "It looks like you might need help. Try describing what you want to accomplish, like 'I want to create a marketing campaign' or 'I need to analyze customer data'.";

/// Guidance for a request too short to classify
pub const NEED_MORE_INFO_MESSAGE: &str = "Please provide more details about what you want to accomplish. For example: 'I want to create a social media campaign for our new product' or 'I need to build a data analysis dashboard'.";

/// What a turn produced, besides the new session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Request was a bare call for help
    HelpNeeded { message: String },

    /// Request too short
    NeedMoreInfo { message: String },

    /// Mentor opened a chat
    Mentor { intent: IntentAnalysis, reply: MentorReply },

    /// Department detected (or kept) and a batch of questions to answer
    Questions {
        department: DepartmentInfo,
        plan: QuestionPlan,
    },

    /// Answer batch rejected; nothing changed
    Invalid { missing: Vec<String>, message: String },

    /// Final prompt ready
    Complete { final_prompt: String, summary: SessionSummary },

    /// Assistant reply to a chat message
    ChatReply { reply: String },
}

impl From<AnswerValidation> for Outcome {
    fn from(v: AnswerValidation) -> Self {
        Self::Invalid {
            missing: v.missing,
            message: v.message,
        }
    }
}

/// Result of one orchestrator operation
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: Session,
    pub outcome: Outcome,
}

impl Transition {
    fn new(session: Session, outcome: Outcome) -> Self {
        Self { session, outcome }
    }

    /// State this turn reports to the caller
    ///
    /// `ERROR` for a rejected answer batch, otherwise the session's state.
    pub fn state(&self) -> SessionState {
        match self.outcome {
            Outcome::Invalid { .. } => SessionState::Error,
            _ => self.session.state,
        }
    }
}

/// Runs sessions against one gateway
pub struct Wizard {
    gateway: Arc<Gateway>,
    config: WizardConfig,
}

impl Wizard {
    pub fn new(gateway: Arc<Gateway>, config: WizardConfig) -> Self {
        debug!(?config, "Wizard::new: called");
        Self { gateway, config }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Begin a new session from a raw request
    pub async fn start_session(&self, raw_request: &str) -> Result<Transition, WizardError> {
        debug!(request_len = raw_request.len(), "start_session: called");
        let mut session = Session::new(raw_request);
        info!(id = %session.id, "Session started");

        let trimmed = raw_request.trim();
        let lower = trimmed.to_lowercase();
        let words = trimmed.split_whitespace().count();

        if lower.contains("help") && words < self.config.help_max_words {
            debug!(%words, "start_session: help request");
            session.state = SessionState::HelpNeeded;
            return Ok(Transition::new(
                session,
                Outcome::HelpNeeded {
                    message: HELP_MESSAGE.to_string(),
                },
            ));
        }

        if trimmed.chars().count() < self.config.min_request_chars {
            debug!("start_session: request too short");
            session.state = SessionState::NeedMoreInfo;
            return Ok(Transition::new(
                session,
                Outcome::NeedMoreInfo {
                    message: NEED_MORE_INFO_MESSAGE.to_string(),
                },
            ));
        }

        let intent = classify_intent(&self.gateway, raw_request).await?;
        session.intent = Some(intent.clone());

        if intent.intent_type.is_chat() {
            debug!(intent = %intent.intent_type, "start_session: chat branch");
            let reply = respond(&self.gateway, raw_request, &intent).await?;
            session.chat_log.push(ChatMessage::assistant(reply.content.clone()));
            session.state = SessionState::ChatMode;
            info!(id = %session.id, state = %session.state, "Session state changed");
            return Ok(Transition::new(session, Outcome::Mentor { intent, reply }));
        }

        debug!("start_session: direct branch");
        self.detect_and_plan(session).await
    }

    /// Submit answers to the pending questions
    pub async fn submit_answers(&self, session: &Session, answers: &Answers) -> Result<Transition, WizardError> {
        debug!(id = %session.id, submitted = answers.len(), "submit_answers: called");
        self.expect_state(session, "submit_answers", &[SessionState::AwaitingAnswers])?;

        if let Err(rejected) = validate_answers(&session.pending_questions, answers) {
            warn!(id = %session.id, missing = ?rejected.missing, "Answers rejected");
            return Ok(Transition::new(session.clone(), rejected.into()));
        }

        let mut next = session.clone();
        for (id, answer) in answers {
            next.answers.insert(id.clone(), answer.trim().to_string());
        }
        next.rounds += 1;

        let department = match next.department_label() {
            Some(d) => d,
            None => {
                // Unreachable through the public API; recover by classifying
                warn!(id = %next.id, "submit_answers: session without department, classifying");
                let info = classify_department(&self.gateway, &next.request).await?;
                let d = info.department;
                next.department = Some(info);
                d
            }
        };

        let plan = plan_questions(
            &self.gateway,
            &next.request,
            department,
            &next.answers,
            self.config.max_questions,
        )
        .await?;

        let capped = self.config.max_rounds > 0 && next.rounds >= self.config.max_rounds;
        if plan.is_complete || capped {
            let forced = !plan.is_complete;
            if forced {
                warn!(id = %next.id, rounds = next.rounds, "Round cap reached, forcing completion");
            }
            return self.complete(next, forced).await;
        }

        debug!(questions = plan.questions.len(), "submit_answers: another round");
        next.pending_questions = plan.questions.clone();
        next.progress = plan.progress_percentage;
        next.next_step = plan.next_step.clone();
        let department = next.department.clone().unwrap_or_else(DepartmentInfo::fallback);
        Ok(Transition::new(next, Outcome::Questions { department, plan }))
    }

    /// Send a free-form chat message
    ///
    /// Accepted in chat mode, while answering questions, and after completion.
    /// Never changes the session state.
    pub async fn send_chat_message(&self, session: &Session, message: &str) -> Result<Transition, WizardError> {
        debug!(id = %session.id, state = %session.state, "send_chat_message: called");
        self.expect_state(
            session,
            "send_chat_message",
            &[SessionState::ChatMode, SessionState::AwaitingAnswers, SessionState::Complete],
        )?;

        let message = message.trim();
        if message.is_empty() {
            debug!("send_chat_message: empty message");
            return Err(WizardError::EmptyMessage);
        }

        let mut turn = ChatTurn::new(&session.request, &session.chat_log, message);
        if session.state != SessionState::ChatMode {
            debug!("send_chat_message: side chat");
            turn = turn
                .with_department(session.department_label())
                .with_answers(&session.answers)
                .with_final_prompt(session.final_prompt.as_deref());
        }
        let reply = chat_turn(&self.gateway, &turn).await?;

        let mut next = session.clone();
        next.chat_log.push(ChatMessage::user(message));
        next.chat_log.push(ChatMessage::assistant(reply.clone()));
        Ok(Transition::new(next, Outcome::ChatReply { reply }))
    }

    /// Leave mentor chat and continue with questions
    ///
    /// The request is enriched with the choice and the whole transcript, the
    /// department is detected afresh and the first batch is planned.
    pub async fn end_chat(&self, session: &Session, last_user_choice: Option<&str>) -> Result<Transition, WizardError> {
        debug!(id = %session.id, "end_chat: called");
        self.expect_state(session, "end_chat", &[SessionState::ChatMode])?;

        let mut next = session.clone();
        next.request = enrich_request(&session.request, last_user_choice, &session.chat_log);
        next.department = None;
        next.answers.clear();
        next.pending_questions.clear();
        info!(id = %next.id, request_len = next.request.len(), "Chat ended, request enriched");

        self.detect_and_plan(next).await
    }

    async fn detect_and_plan(&self, mut session: Session) -> Result<Transition, WizardError> {
        debug!(id = %session.id, "detect_and_plan: called");
        let department = classify_department(&self.gateway, &session.request).await?;
        let plan = plan_questions(
            &self.gateway,
            &session.request,
            department.department,
            &session.answers,
            self.config.max_questions,
        )
        .await?;

        session.department = Some(department.clone());
        session.pending_questions = plan.questions.clone();
        session.progress = plan.progress_percentage;
        session.next_step = plan.next_step.clone();
        session.state = SessionState::AwaitingAnswers;
        info!(id = %session.id, state = %session.state, department = %department.department, "Session state changed");

        Ok(Transition::new(session, Outcome::Questions { department, plan }))
    }

    async fn complete(&self, mut session: Session, forced: bool) -> Result<Transition, WizardError> {
        debug!(id = %session.id, %forced, "complete: called");
        let department = match &session.department {
            Some(info) => info.department,
            None => DepartmentInfo::fallback().department,
        };

        let final_prompt = synthesize(&self.gateway, &session.request, department, &session.answers).await?;

        let summary = SessionSummary {
            department,
            original_request: session.original_request.clone(),
            total_questions_answered: session.answers.len(),
            rounds: session.rounds,
            forced,
        };

        session.pending_questions.clear();
        session.progress = 100;
        session.final_prompt = Some(final_prompt.clone());
        session.summary = Some(summary.clone());
        session.state = SessionState::Complete;
        info!(id = %session.id, state = %session.state, rounds = session.rounds, "Session complete");

        Ok(Transition::new(session, Outcome::Complete { final_prompt, summary }))
    }

    fn expect_state(&self, session: &Session, operation: &'static str, allowed: &[SessionState]) -> Result<(), WizardError> {
        if allowed.contains(&session.state) {
            return Ok(());
        }
        debug!(%operation, state = %session.state, "expect_state: rejected");
        Err(WizardError::InvalidTransition {
            operation,
            state: session.state.to_string(),
        })
    }
}

/// Request plus the user's choice and the chat transcript
pub fn enrich_request(request: &str, last_user_choice: Option<&str>, chat_log: &[ChatMessage]) -> String {
    let mut enriched = request.to_string();
    if let Some(choice) = last_user_choice.map(str::trim).filter(|c| !c.is_empty()) {
        enriched.push_str(" - User chose: ");
        enriched.push_str(choice);
    }
    enriched.push_str("\n\nChat Context:\n");
    let transcript: Vec<String> = chat_log
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect();
    enriched.push_str(&transcript.join("\n"));
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use crate::wizard::{Department, IntentType};

    const DIRECT_INTENT: &str = r#"{"intent_type": "direct_request", "confidence": "high"}"#;
    const QUESTION_INTENT: &str =
        r#"{"intent_type": "question", "confidence": "high", "follow_up_question": "Which stack do you know?"}"#;
    const MARKETING: &str = r#"{"department": "Digital Marketing", "confidence": "high", "reasoning": "campaign"}"#;

    fn plan(count: usize, complete: bool) -> String {
        let questions: Vec<_> = (1..=count)
            .map(|i| serde_json::json!({ "id": format!("q{}", i), "question": format!("Q{}?", i), "type": "free_text" }))
            .collect();
        serde_json::json!({
            "questions": questions,
            "progress_percentage": 30,
            "next_step": "Scoping",
            "is_complete": complete
        })
        .to_string()
    }

    fn wizard(texts: Vec<String>) -> (Wizard, Arc<MockLlmClient>) {
        wizard_with(texts, WizardConfig::default())
    }

    fn wizard_with(texts: Vec<String>, config: WizardConfig) -> (Wizard, Arc<MockLlmClient>) {
        let client = Arc::new(MockLlmClient::with_texts(&texts));
        let gateway = Gateway::new(client.clone(), Arc::new(PromptLoader::embedded_only()), 1024);
        (Wizard::new(Arc::new(gateway), config), client)
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    async fn awaiting(wizard: &Wizard) -> Session {
        wizard
            .start_session("I want to create a social media campaign for our new product")
            .await
            .unwrap()
            .session
    }

    #[tokio::test]
    async fn test_help_needed_without_gateway_call() {
        let (wizard, client) = wizard(vec![]);

        let t = wizard.start_session("help").await.unwrap();

        assert_eq!(t.state(), SessionState::HelpNeeded);
        assert!(matches!(t.outcome, Outcome::HelpNeeded { ref message } if message == HELP_MESSAGE));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_help_in_long_request_is_not_help_needed() {
        let (wizard, _) = wizard(vec![DIRECT_INTENT.to_string(), MARKETING.to_string(), plan(3, false)]);

        let t = wizard
            .start_session("Please help me plan a product launch campaign")
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
    }

    #[tokio::test]
    async fn test_short_request_needs_more_info() {
        let (wizard, client) = wizard(vec![]);

        let t = wizard.start_session("hi").await.unwrap();

        assert_eq!(t.state(), SessionState::NeedMoreInfo);
        assert_eq!(client.call_count(), 0);

        let t = wizard.start_session("   ").await.unwrap();
        assert_eq!(t.state(), SessionState::NeedMoreInfo);
    }

    #[tokio::test]
    async fn test_direct_request_reaches_awaiting_answers() {
        let (wizard, client) = wizard(vec![DIRECT_INTENT.to_string(), MARKETING.to_string(), plan(3, false)]);

        let t = wizard
            .start_session("I want to create a social media campaign for our new product")
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert_eq!(t.session.department_label(), Some(Department::DigitalMarketing));
        assert_eq!(t.session.pending_questions.len(), 3);
        assert_eq!(t.session.progress, 30);
        assert!(t.session.chat_log.is_empty());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gateway_down_still_reaches_awaiting_answers() {
        let (wizard, client) = wizard(vec![]);

        let t = wizard
            .start_session("I want to create a social media campaign for our new product")
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert_eq!(t.session.department_label(), Some(Department::AiEngineering));
        assert_eq!(t.session.pending_questions.len(), 1);
        assert_eq!(t.session.pending_questions[0].text, "What is your primary objective?");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_question_intent_enters_chat_mode() {
        let (wizard, client) = wizard(vec![QUESTION_INTENT.to_string(), "Start with SQL and Python.".to_string()]);

        let t = wizard
            .start_session("What is the best way to learn data engineering?")
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::ChatMode);
        assert!(t.session.department.is_none());
        assert_eq!(t.session.chat_log, vec![ChatMessage::assistant("Start with SQL and Python.")]);
        assert_eq!(client.call_count(), 2);
        match t.outcome {
            Outcome::Mentor { intent, reply } => {
                assert_eq!(intent.intent_type, IntentType::Question);
                assert_eq!(reply.follow_up, "Which stack do you know?");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_without_planner_call() {
        let (wizard, client) = wizard(vec![DIRECT_INTENT.to_string(), MARKETING.to_string(), plan(2, false)]);
        let session = awaiting(&wizard).await;
        let calls_before = client.call_count();

        let t = wizard
            .submit_answers(&session, &answers(&[("q1", ""), ("q2", "valid")]))
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::Error);
        assert_eq!(t.session.state, SessionState::AwaitingAnswers);
        assert_eq!(t.session, session);
        match t.outcome {
            Outcome::Invalid { missing, message } => {
                assert_eq!(missing, vec!["q1"]);
                assert!(message.contains("q1"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_override_completes_and_synthesizes() {
        let (wizard, client) = wizard(vec![
            DIRECT_INTENT.to_string(),
            MARKETING.to_string(),
            plan(3, false),
            // Model claims more work remains; two questions with answers overrides it
            plan(2, false),
            "FINAL PROMPT".to_string(),
        ]);
        let session = awaiting(&wizard).await;

        let t = wizard
            .submit_answers(&session, &answers(&[("q1", "Gen Z"), ("q2", "Instagram"), ("q3", "$5k")]))
            .await
            .unwrap();

        assert_eq!(t.state(), SessionState::Complete);
        assert_eq!(t.session.final_prompt.as_deref(), Some("FINAL PROMPT"));
        assert_eq!(t.session.progress, 100);
        assert!(t.session.pending_questions.is_empty());
        match t.outcome {
            Outcome::Complete { final_prompt, summary } => {
                assert_eq!(final_prompt, "FINAL PROMPT");
                assert_eq!(summary.department, Department::DigitalMarketing);
                assert_eq!(summary.total_questions_answered, 3);
                assert_eq!(summary.rounds, 1);
                assert!(!summary.forced);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.call_count(), 5);
    }

    #[tokio::test]
    async fn test_another_round_accumulates_answers() {
        let (wizard, _) = wizard(vec![
            DIRECT_INTENT.to_string(),
            MARKETING.to_string(),
            plan(1, false),
            plan(3, false),
        ]);
        let session = awaiting(&wizard).await;

        let t = wizard.submit_answers(&session, &answers(&[("q1", " Gen Z ")])).await.unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert_eq!(t.session.answers, answers(&[("q1", "Gen Z")]));
        assert_eq!(t.session.rounds, 1);
        // q1 is answered, so the new batch is renumbered around it
        let ids: Vec<_> = t.session.pending_questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn test_unusable_plan_mid_dialogue_asks_fallback_question() {
        let (wizard, client) = wizard(vec![
            DIRECT_INTENT.to_string(),
            MARKETING.to_string(),
            plan(1, false),
            "I think we have enough now.".to_string(),
        ]);
        let session = awaiting(&wizard).await;

        let t = wizard.submit_answers(&session, &answers(&[("q1", "Gen Z")])).await.unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert!(t.session.final_prompt.is_none());
        assert_eq!(t.session.progress, 50);
        assert_eq!(t.session.pending_questions.len(), 1);
        assert_eq!(t.session.pending_questions[0].id, "q2");
        // no synthesis call
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_round_cap_forces_completion() {
        let config = WizardConfig {
            max_rounds: 1,
            ..WizardConfig::default()
        };
        let (wizard, _) = wizard_with(
            vec![
                DIRECT_INTENT.to_string(),
                MARKETING.to_string(),
                plan(1, false),
                plan(4, false),
                "CAPPED PROMPT".to_string(),
            ],
            config,
        );
        let session = awaiting(&wizard).await;

        let t = wizard.submit_answers(&session, &answers(&[("q1", "x")])).await.unwrap();

        assert_eq!(t.state(), SessionState::Complete);
        match t.outcome {
            Outcome::Complete { summary, .. } => assert!(summary.forced),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_then_end_chat_enriches_and_replaces() {
        let (wizard, client) = wizard(vec![
            QUESTION_INTENT.to_string(),
            "Try a churn model.".to_string(),
            "Use logistic regression first.".to_string(),
            r#"{"department": "AI Engineering", "confidence": "medium"}"#.to_string(),
            plan(2, false),
        ]);

        let chat = wizard
            .start_session("How should I approach my first ML portfolio project?")
            .await
            .unwrap()
            .session;
        let chat = wizard
            .send_chat_message(&chat, "Which model should I start with?")
            .await
            .unwrap()
            .session;
        assert_eq!(chat.state, SessionState::ChatMode);
        assert_eq!(chat.chat_log.len(), 3);

        let t = wizard.end_chat(&chat, Some("churn model")).await.unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert_eq!(t.session.department_label(), Some(Department::AiEngineering));
        assert_eq!(t.session.original_request, "How should I approach my first ML portfolio project?");
        assert_eq!(
            t.session.request,
            "How should I approach my first ML portfolio project? - User chose: churn model\n\nChat Context:\n\
             assistant: Try a churn model.\n\
             user: Which model should I start with?\n\
             assistant: Use logistic regression first."
        );
        // Department detection saw the enriched request
        assert!(client.request_texts()[3].contains("User chose: churn model"));
        assert_eq!(t.session.chat_log.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_chat_message_rejected_without_call() {
        let (wizard, client) = wizard(vec![QUESTION_INTENT.to_string(), "reply".to_string()]);
        let chat = wizard
            .start_session("What is the best way to learn data engineering?")
            .await
            .unwrap()
            .session;

        let err = wizard.send_chat_message(&chat, "   ").await.unwrap_err();

        assert!(matches!(err, WizardError::EmptyMessage));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_side_chat_keeps_state() {
        let (wizard, client) = wizard(vec![
            DIRECT_INTENT.to_string(),
            MARKETING.to_string(),
            plan(2, false),
            "Instagram suits Gen Z.".to_string(),
        ]);
        let session = awaiting(&wizard).await;

        let t = wizard.send_chat_message(&session, "Which channel is best?").await.unwrap();

        assert_eq!(t.state(), SessionState::AwaitingAnswers);
        assert_eq!(t.session.pending_questions, session.pending_questions);
        assert_eq!(t.session.chat_log.len(), 2);
        assert!(client.request_texts()[3].contains("Department: Digital Marketing"));
    }

    #[tokio::test]
    async fn test_wrong_state_operations_rejected() {
        let (wizard, _) = wizard(vec![QUESTION_INTENT.to_string(), "reply".to_string()]);
        let chat = wizard
            .start_session("What is the best way to learn data engineering?")
            .await
            .unwrap()
            .session;

        let err = wizard.submit_answers(&chat, &answers(&[("q1", "x")])).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::InvalidTransition { operation: "submit_answers", ref state } if state == "CHAT_MODE"
        ));

        let fresh = Session::new("anything");
        assert!(wizard.end_chat(&fresh, None).await.is_err());
        assert!(wizard.send_chat_message(&fresh, "hello").await.is_err());
    }

    #[test]
    fn test_enrich_request_without_choice() {
        let log = vec![ChatMessage::assistant("a"), ChatMessage::user("b")];
        assert_eq!(
            enrich_request("req", Some("  "), &log),
            "req\n\nChat Context:\nassistant: a\nuser: b"
        );
        assert_eq!(enrich_request("req", None, &[]), "req\n\nChat Context:\n");
    }
}
