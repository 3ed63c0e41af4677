//! Diagram use case implementation.
//!
//! `DiagramUseCase` drives the per-session plan state machine against the
//! generator: planning, step execution, and free chat. Each operation takes
//! what it needs from the session, releases the lock, awaits the generator,
//! and only then re-locks to apply the result, so a session is never observed
//! half-updated and other sessions are never blocked.

use crate::intent::route_for;
use crate::session::{SessionHandle, SessionStore};
use brainstorm_core::board::{board_context, cap_user_text};
use brainstorm_core::config::{BrainstormConfig, Limits};
use brainstorm_core::element::Element;
use brainstorm_core::generator::{Generator, GeneratorRequest, GeneratorRole, RawOutput};
use brainstorm_core::plan::extract_plan;
use brainstorm_core::repair::repair_response;
use brainstorm_core::session::{MessageRole, StepStart};
use brainstorm_core::synth::DiagramSynthesizer;
use brainstorm_core::{BrainstormError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Reply sent when a step is requested after the plan has finished.
pub const PLAN_COMPLETE_REPLY: &str = "The plan is complete.";

/// Result of a planning request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutcome {
    pub steps: Vec<String>,
}

/// Result of executing one plan step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub reply: String,
    pub new_elements: Vec<Element>,
    pub next_step_index: usize,
    pub plan_complete: bool,
}

/// Result of a free chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub reply: String,
    pub new_elements: Vec<Element>,
}

/// Use case for building diagrams through plans and chat.
pub struct DiagramUseCase {
    /// Sessions keyed by connection id
    sessions: Arc<SessionStore>,
    generator: Arc<dyn Generator>,
    synthesizer: DiagramSynthesizer,
    limits: Limits,
    /// Caller-level bound on each generator call
    call_timeout: Option<Duration>,
}

impl DiagramUseCase {
    /// Creates a new `DiagramUseCase` with its own session store.
    pub fn new(generator: Arc<dyn Generator>, config: &BrainstormConfig) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            generator,
            synthesizer: DiagramSynthesizer::new(config.layout),
            limits: config.limits,
            call_timeout: Some(Duration::from_secs(config.generator.timeout_secs))
                .filter(|d| !d.is_zero()),
        }
    }

    /// Shares an existing session store.
    pub fn with_store(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn open_session(&self, connection_id: &str) {
        self.sessions.open(connection_id).await;
    }

    pub async fn close_session(&self, connection_id: &str) -> bool {
        self.sessions.close(connection_id).await
    }

    /// Current elements of a session.
    pub async fn elements(&self, session_id: &str) -> Result<Vec<Element>> {
        let handle = self.sessions.get(session_id).await?;
        let session = handle.lock().await;
        Ok(session.elements.clone())
    }

    /// Current plan, cursor and completion flag of a session.
    pub async fn plan_status(&self, session_id: &str) -> Result<(Vec<String>, usize, bool)> {
        let handle = self.sessions.get(session_id).await?;
        let session = handle.lock().await;
        Ok((
            session.plan_steps().to_vec(),
            session.current_step(),
            session.plan_complete(),
        ))
    }

    /// Asks the planner to decompose `user_text` and installs the result as
    /// the session's plan, replacing any previous one.
    pub async fn request_plan(&self, session_id: &str, user_text: &str) -> Result<PlanOutcome> {
        let handle = self.sessions.get(session_id).await?;
        let capped = cap_user_text(user_text, &self.limits);

        let (round, board) = {
            let mut session = handle.lock().await;
            session.record_message(MessageRole::User, capped.as_str());
            let round = session.begin_planning();
            (round, board_context(&session.elements, &self.limits))
        };

        let request = GeneratorRequest::new(GeneratorRole::StepPlanner, capped.as_str(), board);
        let raw = match self.invoke(request).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!("[DiagramUseCase] Planning failed for {}: {}", session_id, err);
                handle.lock().await.abort_planning(round);
                return Err(err);
            }
        };

        // Echoes are detected against the full request, not the capped one.
        let plan = extract_plan(&raw, user_text.trim());
        let mut session = handle.lock().await;
        session.apply_plan(round, plan.steps.clone())?;
        session.record_message(MessageRole::Assistant, format!("Plan: {}", plan.steps.join("; ")));
        tracing::info!("[DiagramUseCase] {} planned {} steps", session_id, plan.len());

        Ok(PlanOutcome { steps: plan.steps })
    }

    /// Executes the current step of the session's plan.
    ///
    /// After the last step this is a no-op returning `plan_complete = true`
    /// and no elements. A generator failure returns `StepFailed` with the
    /// step index; the cursor does not move, so the same step can be retried.
    pub async fn execute_next_step(&self, session_id: &str) -> Result<StepOutcome> {
        let handle = self.sessions.get(session_id).await?;

        let (ticket, board) = {
            let mut session = handle.lock().await;
            match session.begin_step()? {
                StepStart::Complete { total } => {
                    return Ok(StepOutcome {
                        reply: PLAN_COMPLETE_REPLY.to_string(),
                        new_elements: Vec::new(),
                        next_step_index: total,
                        plan_complete: true,
                    });
                }
                StepStart::Run(ticket) => {
                    (ticket, board_context(&session.elements, &self.limits))
                }
            }
        };

        tracing::info!(
            "[DiagramUseCase] {} executing step {}: {}",
            session_id,
            ticket.index,
            ticket.text
        );
        let request =
            GeneratorRequest::new(GeneratorRole::StepExecutor, ticket.text.as_str(), board);
        let raw = match self.invoke(request).await {
            Ok(raw) => raw,
            Err(err) => {
                let mut session = handle.lock().await;
                session.abort_step(&ticket);
                tracing::error!(
                    "[DiagramUseCase] Step {} failed for {}: {}",
                    ticket.index,
                    session_id,
                    err
                );
                return Err(BrainstormError::step_failed(
                    ticket.index,
                    session.plan_complete(),
                    &err,
                ));
            }
        };

        let repaired = repair_response(&raw);
        let mut session = handle.lock().await;
        let synthesis = self
            .synthesizer
            .synthesize_step(&ticket.text, &repaired.elements, &session.elements);
        tracing::debug!(
            "[DiagramUseCase] Step {} produced {} elements via {:?}",
            ticket.index,
            synthesis.elements.len(),
            synthesis.path
        );

        session.commit_step(&ticket, synthesis.elements.clone())?;
        let reply = if repaired.reply.trim().is_empty() {
            format!("Step {}: {}", ticket.index + 1, ticket.text)
        } else {
            repaired.reply
        };
        session.record_message(MessageRole::Assistant, reply.as_str());

        Ok(StepOutcome {
            reply,
            new_elements: synthesis.elements,
            next_step_index: session.current_step(),
            plan_complete: session.plan_complete(),
        })
    }

    /// Sends a message straight to the free chat role. Elements in the reply
    /// are merged through the structured path only; the plan is untouched.
    pub async fn free_chat(
        &self,
        session_id: &str,
        user_text: &str,
        history_tail: usize,
    ) -> Result<ChatOutcome> {
        self.chat(
            session_id,
            GeneratorRole::FreeChat,
            user_text,
            history_tail,
            Vec::new(),
        )
        .await
    }

    /// Classifies the message and answers it with the routed role.
    ///
    /// An unavailable classifier or unrecognized classification falls back to
    /// the step executor role.
    pub async fn handle_message(
        &self,
        session_id: &str,
        user_text: &str,
        images: Vec<Vec<u8>>,
    ) -> Result<ChatOutcome> {
        self.sessions.get(session_id).await?;
        let user_text = cap_user_text(user_text, &self.limits);

        let classify =
            GeneratorRequest::new(GeneratorRole::IntentClassifier, user_text.as_str(), "");
        let role = match self.invoke(classify).await {
            Ok(raw) => route_for(&raw),
            Err(err) => {
                tracing::warn!(
                    "[DiagramUseCase] Classifier unavailable ({}), defaulting to executor",
                    err
                );
                GeneratorRole::StepExecutor
            }
        };
        tracing::debug!("[DiagramUseCase] Routing message for {} to {}", session_id, role);

        self.chat(
            session_id,
            role,
            &user_text,
            self.limits.history_tail,
            images,
        )
        .await
    }

    async fn chat(
        &self,
        session_id: &str,
        role: GeneratorRole,
        user_text: &str,
        history_tail: usize,
        images: Vec<Vec<u8>>,
    ) -> Result<ChatOutcome> {
        let handle = self.sessions.get(session_id).await?;
        let user_text = cap_user_text(user_text, &self.limits);

        let request = {
            let mut session = handle.lock().await;
            let history = session.history_text(history_tail);
            session.record_message(MessageRole::User, user_text.as_str());
            let board = board_context(&session.elements, &self.limits);
            GeneratorRequest::new(role, user_text.as_str(), board)
                .with_history(history)
                .with_images(images)
        };

        let raw = self.invoke(request).await?;
        let repaired = repair_response(&raw);
        Ok(self
            .merge_chat_reply(&handle, repaired.reply, &repaired.elements)
            .await)
    }

    async fn merge_chat_reply(
        &self,
        handle: &SessionHandle,
        reply: String,
        records: &[serde_json::Value],
    ) -> ChatOutcome {
        let mut session = handle.lock().await;
        let new_elements = self.synthesizer.from_records(records, &session.elements);
        session.merge_elements(new_elements.clone());
        session.record_message(MessageRole::Assistant, reply.as_str());
        ChatOutcome { reply, new_elements }
    }

    async fn invoke(&self, request: GeneratorRequest) -> Result<RawOutput> {
        let role = request.role;
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.invoke(request))
                .await
                .map_err(|_| {
                    BrainstormError::unavailable(format!(
                        "{} call timed out after {:?}",
                        role, limit
                    ))
                })?,
            None => self.generator.invoke(request).await,
        }
    }
}
