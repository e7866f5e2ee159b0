#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use course_advisor::agents::advisor::Advisor;
use course_advisor::error::AppError;
use course_advisor::llm::provider::{LLMProvider, LLMResponse, Message, Sampling, TokenUsage};
use course_advisor::seed::seed_if_empty;
use course_advisor::session::memory::InMemorySessionStore;
use course_advisor::session::SessionStore;
use course_advisor::store::sqlite::SqliteCatalog;
use course_advisor::tools::definition::{ToolCall, ToolSpec};
use course_advisor::tools::executor::ToolExecutor;
use course_advisor::tools::registry::ToolRegistry;

pub enum Step {
    Reply(LLMResponse),
    Fail(String),
    Hang,
}

/// One request the backend received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub messages: Vec<Message>,
    pub tools_advertised: usize,
}

#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    async fn next(&self, messages: Vec<Message>, tools_advertised: usize) -> Result<LLMResponse, AppError> {
        self.seen.lock().unwrap().push(Seen {
            messages,
            tools_advertised,
        });
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(resp)) => Ok(resp),
            Some(Step::Fail(msg)) => Err(AppError::Message(msg)),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(AppError::Message("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, messages: Vec<Message>, _sampling: Sampling) -> Result<LLMResponse, AppError> {
        self.next(messages, 0).await
    }

    async fn chat_with_tools(
        &self,
        messages: Vec<Message>,
        tools: &[ToolSpec],
        _sampling: Sampling,
    ) -> Result<LLMResponse, AppError> {
        self.next(messages, tools.len()).await
    }
}

pub fn text(content: &str) -> Step {
    Step::Reply(LLMResponse {
        content: content.to_string(),
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            estimated: false,
        },
        model: "scripted-model".to_string(),
        finish_reason: Some("stop".to_string()),
        tool_calls: Vec::new(),
    })
}

pub fn tool_request(calls: Vec<ToolCall>) -> Step {
    Step::Reply(LLMResponse {
        content: String::new(),
        usage: TokenUsage::default(),
        model: "scripted-model".to_string(),
        finish_reason: Some("tool_calls".to_string()),
        tool_calls: calls,
    })
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

pub struct Harness {
    pub _dir: TempDir,
    pub advisor: Advisor,
    pub sessions: Arc<InMemorySessionStore>,
    pub provider: Arc<ScriptedProvider>,
}

/// Advisor over the bundled catalog in a temp SQLite file and in-memory sessions.
pub fn harness(steps: Vec<Step>) -> Harness {
    let provider = ScriptedProvider::new(steps);
    let llm: Arc<dyn LLMProvider> = provider.clone();
    let (dir, advisor, sessions) = advisor_over(llm);
    Harness {
        _dir: dir,
        advisor,
        sessions,
        provider,
    }
}

/// Same wiring as [`harness`] around an arbitrary backend.
pub fn advisor_over(llm: Arc<dyn LLMProvider>) -> (TempDir, Advisor, Arc<InMemorySessionStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = SqliteCatalog::new(dir.path().join("catalog.db")).expect("catalog");
    seed_if_empty(&catalog).expect("seed");

    let registry = Arc::new(ToolRegistry::builtin().expect("registry"));
    let executor = ToolExecutor::new(registry, Arc::new(catalog));
    let sessions = Arc::new(InMemorySessionStore::default());
    let store: Arc<dyn SessionStore> = sessions.clone();
    (dir, Advisor::new(llm, executor, store), sessions)
}
