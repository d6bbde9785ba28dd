//! REPL session management

use colored::Colorize;
use eyre::Result;
use historystore::{HistoryRecord, HistoryStore};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::format::format_prompt_output;
use crate::llm::is_error_marker;
use crate::session::{Outcome, Session, SessionState, Transition, Wizard};
use crate::wizard::{Answers, Question, QuestionKind};

/// Interactive wizard session
pub struct ReplSession {
    wizard: Wizard,
    history: Option<HistoryStore>,
    session: Option<Session>,
}

/// What one line of input asked for
enum Input {
    Line(String),
    Quit,
}

impl ReplSession {
    /// Create a new REPL session; `history` is None when saving is disabled
    pub fn new(wizard: Wizard, history: Option<HistoryStore>) -> Self {
        Self {
            wizard,
            history,
            session: None,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_request: Option<String>) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        if let Some(request) = initial_request {
            println!("{} {}", ">".bright_green(), request);
            self.process_input(&mut rl, &request).await?;
        }

        loop {
            let input = match read_line(&mut rl, &self.prompt_marker())? {
                Input::Line(line) => line,
                Input::Quit => break,
            };
            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                match self.handle_slash_command(&mut rl, &input).await? {
                    SlashResult::Continue => continue,
                    SlashResult::Quit => break,
                }
            } else {
                self.process_input(&mut rl, &input).await?;
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn state(&self) -> Option<SessionState> {
        self.session.as_ref().map(|s| s.state)
    }

    fn prompt_marker(&self) -> String {
        match self.state() {
            Some(SessionState::ChatMode) => format!("{} ", "chat>".bright_blue()),
            Some(SessionState::Complete) => format!("{} ", "ask>".bright_blue()),
            _ => format!("{} ", ">".bright_green()),
        }
    }

    /// Plain input: a new request, or a chat message once a chat is open
    async fn process_input(&mut self, rl: &mut DefaultEditor, input: &str) -> Result<()> {
        debug!(state = ?self.state(), "process_input: called");
        match self.session.clone() {
            Some(session) if matches!(session.state, SessionState::ChatMode | SessionState::Complete) => {
                self.chat(&session, input).await
            }
            _ => {
                let transition = self.with_spinner(self.wizard.start_session(input)).await?;
                self.apply(rl, transition).await
            }
        }
    }

    /// Send a chat message; a rejected message is reported and the session kept
    async fn chat(&mut self, session: &Session, message: &str) -> Result<()> {
        if !accepts_chat(session.state) {
            debug!(state = %session.state, "chat: state does not accept chat");
            println!("{}", "Chat is available during mentor chat, while answering, or after completion.".dimmed());
            return Ok(());
        }
        match self.with_spinner(self.wizard.send_chat_message(session, message)).await {
            Ok(transition) => {
                if let Outcome::ChatReply { reply } = &transition.outcome {
                    print_assistant(reply);
                }
                self.session = Some(transition.session);
            }
            Err(e) => print_error(&e),
        }
        Ok(())
    }

    /// Show a transition, then keep collecting answers while questions are pending
    async fn apply(&mut self, rl: &mut DefaultEditor, transition: Transition) -> Result<()> {
        let mut transition = transition;
        loop {
            self.show(&transition);
            let state = transition.state();
            self.session = Some(transition.session.clone());

            match state {
                SessionState::Complete => {
                    self.save_history(&transition.session);
                    return Ok(());
                }
                SessionState::AwaitingAnswers | SessionState::Error => {
                    let Some((session, answers)) = self.collect_answers(rl, &transition.session).await? else {
                        return Ok(());
                    };
                    transition = self.with_spinner(self.wizard.submit_answers(&session, &answers)).await?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn show(&self, transition: &Transition) {
        match &transition.outcome {
            Outcome::HelpNeeded { message } | Outcome::NeedMoreInfo { message } => {
                println!("{} {}", "!".yellow(), message);
            }
            Outcome::Mentor { reply, .. } => {
                print_assistant(&reply.content);
                println!("{}", reply.follow_up.italic());
                println!(
                    "{}",
                    format!("Keep chatting, or type {} to start building your prompt.", "/done [choice]").dimmed()
                );
            }
            Outcome::Questions { department, plan } => {
                println!();
                println!(
                    "{} {} {} ({} confidence)",
                    "Department:".bright_cyan(),
                    department.department.icon(),
                    department.department.to_string().bold(),
                    department.confidence
                );
                if !department.rationale.is_empty() {
                    println!("  {}", department.rationale.dimmed());
                }
                println!(
                    "{} {}% {}",
                    "Progress:".bright_cyan(),
                    plan.progress_percentage,
                    plan.next_step.dimmed()
                );
            }
            Outcome::Invalid { message, .. } => {
                println!("{} {}", "Error:".red(), message);
            }
            Outcome::Complete { final_prompt, summary } => {
                println!();
                if is_error_marker(final_prompt) {
                    println!("{} {}", "Error:".red(), final_prompt);
                    return;
                }
                let doc = format_prompt_output(
                    final_prompt,
                    summary.department,
                    &summary.original_request,
                    chrono::Local::now(),
                );
                println!("{}", doc);
                println!();
                let mut recap = format!(
                    "{} questions answered over {} round(s)",
                    summary.total_questions_answered, summary.rounds
                );
                if summary.forced {
                    recap.push_str(", completed at the round limit");
                }
                println!("{}", recap.dimmed());
                println!(
                    "{}",
                    format!("Ask follow-up questions, or type {} to start over.", "/new").dimmed()
                );
            }
            Outcome::ChatReply { reply } => print_assistant(reply),
        }
    }

    /// Ask each pending question; None if the user left the round
    ///
    /// Side chat during the round extends the chat log, so the session comes back too.
    async fn collect_answers(&mut self, rl: &mut DefaultEditor, session: &Session) -> Result<Option<(Session, Answers)>> {
        let mut answers = Answers::new();
        let mut session = session.clone();
        let total = session.pending_questions.len();

        let mut index = 0;
        while index < total {
            let question = session.pending_questions[index].clone();
            print_question(index + 1, total, &question);

            let line = match read_line(rl, &format!("{} ", "answer>".bright_green()))? {
                Input::Line(line) => line,
                Input::Quit => return Ok(None),
            };

            if let Some(message) = line.strip_prefix("/chat") {
                let transition = self.with_spinner(self.wizard.send_chat_message(&session, message)).await;
                match transition {
                    Ok(t) => {
                        if let Outcome::ChatReply { reply } = &t.outcome {
                            print_assistant(reply);
                        }
                        session = t.session;
                        self.session = Some(session.clone());
                    }
                    Err(e) => print_error(&e),
                }
                continue;
            }
            if line == "/new" || line == "/quit" || line == "/q" {
                println!("{}", "Question round abandoned.".dimmed());
                if line == "/new" {
                    self.session = None;
                }
                return Ok(None);
            }

            let answer = resolve_choice(&question, &line);
            if answer.is_empty() && !question.required {
                index += 1;
                continue;
            }
            answers.insert(question.id.clone(), answer);
            index += 1;
        }

        Ok(Some((session, answers)))
    }

    fn save_history(&self, session: &Session) {
        let Some(store) = &self.history else {
            debug!("save_history: history disabled");
            return;
        };
        let (Some(final_prompt), Some(summary)) = (&session.final_prompt, &session.summary) else {
            return;
        };
        if is_error_marker(final_prompt) {
            warn!("save_history: not saving failed synthesis");
            return;
        }

        let record = HistoryRecord::new(
            summary.department.label(),
            &summary.original_request,
            final_prompt,
            summary.total_questions_answered,
        );
        match store.save(&record) {
            Ok(id) => {
                info!(%id, "History saved");
                println!("{} {}", "Saved to history:".dimmed(), id);
            }
            Err(e) => {
                warn!(error = %e, "Failed to save history");
                println!("{} {}", "Error saving history:".red(), e);
            }
        }
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, rl: &mut DefaultEditor, input: &str) -> Result<SlashResult> {
        let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
        let rest = rest.trim();

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return Ok(SlashResult::Quit),
            "/new" | "/reset" => {
                self.session = None;
                println!("{}", "Session cleared. Describe what you want to create.".dimmed());
            }
            "/done" => match self.session.clone() {
                Some(session) if session.state == SessionState::ChatMode => {
                    let choice = if rest.is_empty() { None } else { Some(rest) };
                    match self.with_spinner(self.wizard.end_chat(&session, choice)).await {
                        Ok(transition) => self.apply(rl, transition).await?,
                        Err(e) => print_error(&e),
                    }
                }
                _ => println!("{}", "/done only applies during mentor chat.".dimmed()),
            },
            "/chat" => match self.session.clone() {
                Some(session) => self.chat(&session, rest).await?,
                None => println!("{}", "Start a session first.".dimmed()),
            },
            "/status" => self.print_status(),
            "/prompt" => match self.session.as_ref().and_then(|s| s.final_prompt.as_ref()) {
                Some(prompt) => println!("{}", prompt),
                None => println!("{}", "No prompt generated yet.".dimmed()),
            },
            "/history" => self.print_chat_log(),
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Ok(SlashResult::Continue)
    }

    /// Run a wizard call, mapping its error into the REPL's error type
    async fn with_spinner<F>(&self, call: F) -> Result<Transition>
    where
        F: std::future::Future<Output = Result<Transition, crate::wizard::WizardError>>,
    {
        println!("{}", "thinking...".dimmed());
        call.await.map_err(|e| eyre::eyre!(e))
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("{}", "PromptWizard".bright_cyan().bold());
        println!("Describe what you want to create and answer a few questions.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Print help message
    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:16} Show this help", "/help".yellow());
        println!("  {:16} Exit", "/quit".yellow());
        println!("  {:16} Start a new session", "/new".yellow());
        println!("  {:16} End mentor chat and build the prompt", "/done [choice]".yellow());
        println!("  {:16} Ask the mentor something (also while answering)", "/chat <message>".yellow());
        println!("  {:16} Show session state", "/status".yellow());
        println!("  {:16} Show the final prompt", "/prompt".yellow());
        println!("  {:16} Show the chat log", "/history".yellow());
        println!();
    }

    fn print_status(&self) {
        let Some(session) = &self.session else {
            println!("{}", "No active session.".dimmed());
            return;
        };
        println!();
        println!("{} {}", "State:".bright_cyan(), session.state);
        if let Some(department) = session.department_label() {
            println!("{} {}", "Department:".bright_cyan(), department);
        }
        println!("{} {}", "Answers:".bright_cyan(), session.answers.len());
        println!("{} {}", "Rounds:".bright_cyan(), session.rounds);
        println!("{} {}%", "Progress:".bright_cyan(), session.progress);
        println!();
    }

    /// Print the chat log
    fn print_chat_log(&self) {
        let log = self.session.as_ref().map(|s| s.chat_log.as_slice()).unwrap_or_default();
        if log.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in log.iter().enumerate() {
            let role = match msg.role {
                crate::llm::Role::User => "User".bright_green(),
                crate::llm::Role::Assistant => "Assistant".bright_blue(),
            };
            let preview: String = msg.content.chars().take(50).collect();
            let preview = if msg.content.chars().count() > 50 {
                format!("{}...", preview)
            } else {
                preview
            };
            println!("  {}. {}: {}", i + 1, role, preview);
        }
        println!();
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

fn read_line(rl: &mut DefaultEditor, prompt: &str) -> Result<Input> {
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let input = line.trim().to_string();
                if !input.is_empty() {
                    let _ = rl.add_history_entry(&input);
                }
                return Ok(Input::Line(input));
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C - just show new prompt
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(Input::Quit);
            }
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        }
    }
}

/// States in which a free-form chat message is accepted
fn accepts_chat(state: SessionState) -> bool {
    matches!(
        state,
        SessionState::ChatMode | SessionState::AwaitingAnswers | SessionState::Complete
    )
}

fn print_error(e: &eyre::Report) {
    println!("{} {}", "Error:".red(), e);
}

fn print_assistant(text: &str) {
    println!();
    if is_error_marker(text) {
        println!("{} {}", "Error:".red(), text);
    } else {
        println!("{}", text);
    }
    println!();
}

fn print_question(position: usize, total: usize, question: &Question) {
    println!();
    let marker = if question.required { "" } else { " (optional)" };
    println!(
        "{} {}{}",
        format!("[{}/{}]", position, total).bright_cyan(),
        question.text.bold(),
        marker.dimmed()
    );
    if question.kind == QuestionKind::MultipleChoice {
        for (i, option) in question.options.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).yellow(), option);
        }
        println!("{}", "  Pick a number or type your own answer.".dimmed());
    }
}

/// A number picks the matching option; anything else is the answer itself
fn resolve_choice(question: &Question, line: &str) -> String {
    if question.kind == QuestionKind::MultipleChoice
        && let Ok(n) = line.parse::<usize>()
        && (1..=question.options.len()).contains(&n)
    {
        return question.options[n - 1].clone();
    }
    line.to_string()
}
