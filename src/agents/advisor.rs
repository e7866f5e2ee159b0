use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agents::prompt;
use crate::error::AgentError;
use crate::llm::provider::{LLMProvider, Message, Sampling};
use crate::orchestration::state::TurnOutcome;
use crate::orchestration::turn::{run_turn, TurnContext};
use crate::session::{ConversationTurn, SessionStore};
use crate::tools::executor::ToolExecutor;

/// The advising agent: persona, model backend, tools and history, wired together.
#[derive(Clone)]
pub struct Advisor {
    llm: Arc<dyn LLMProvider>,
    executor: ToolExecutor,
    sessions: Arc<dyn SessionStore>,
    system_prompt: String,
    sampling: Sampling,
}

impl Advisor {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        executor: ToolExecutor,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            llm,
            executor,
            sessions,
            system_prompt: prompt::system_prompt(None),
            sampling: Sampling::default(),
        }
    }

    pub fn with_system_prompt(mut self, override_prompt: Option<&str>) -> Self {
        self.system_prompt = prompt::system_prompt(override_prompt);
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn build_messages(&self, history: &[ConversationTurn], user_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(history.iter().map(ConversationTurn::to_message));
        messages.push(Message::user(user_message));
        messages
    }

    /// One user exchange. The `(user, answer)` pair is stored only when the turn completes;
    /// failures and cancellation leave history as it was.
    ///
    /// Callers serialize turns per session (see [`crate::session::SessionLocks`]).
    pub async fn respond(
        &self,
        session_id: &str,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AgentError> {
        let history = self
            .sessions
            .load(session_id)
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;
        info!(
            event_name = "turn.started",
            session_id,
            history_len = history.len(),
            model = self.llm.model_id(),
            provider = self.llm.provider_name(),
            "processing user message"
        );

        let ctx = TurnContext {
            llm: self.llm.as_ref(),
            executor: &self.executor,
            sampling: self.sampling,
            cancel,
            session_id,
        };
        let outcome = run_turn(&ctx, self.build_messages(&history, user_message)).await?;

        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        self.sessions
            .append(
                session_id,
                ConversationTurn::user(user_message),
                ConversationTurn::assistant(outcome.response.clone()),
            )
            .await
            .map_err(|e| AgentError::Session(e.to_string()))?;
        Ok(outcome)
    }
}
