use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{AgentError, AppError};
use crate::llm::provider::{LLMProvider, LLMResponse, Message, Sampling};
use crate::orchestration::state::{TurnOutcome, TurnPhase, TurnState};
use crate::orchestration::tool_events::emit_tool_traces;
use crate::tools::definition::ToolTrace;
use crate::tools::executor::ToolExecutor;

/// Collaborators of one orchestration pass.
pub struct TurnContext<'a> {
    pub llm: &'a dyn LLMProvider,
    pub executor: &'a ToolExecutor,
    pub sampling: Sampling,
    pub cancel: &'a CancellationToken,
    pub session_id: &'a str,
}

/// Runs one user turn over `messages` (system turn + history + new user turn).
///
/// At most one round of tools: the follow-up call never advertises the catalog and
/// any tool requests it still makes are dropped. Nothing here touches session storage.
pub async fn run_turn(ctx: &TurnContext<'_>, mut messages: Vec<Message>) -> Result<TurnOutcome, AgentError> {
    let mut state = TurnState::default();

    let first = match guarded(
        ctx.cancel,
        ctx.llm.chat_with_tools(messages.clone(), ctx.executor.definitions(), ctx.sampling),
    )
    .await
    {
        Ok(resp) => resp,
        Err(err) => return Err(fail(&mut state, ctx, err)),
    };
    state.record_usage(&first.usage);

    if first.tool_calls.is_empty() {
        state.advance(TurnPhase::DirectAnswer);
        info!(
            event_name = "turn.completed",
            session_id = ctx.session_id,
            tools_used = false,
            input_tokens = state.usage.input_tokens,
            output_tokens = state.usage.output_tokens,
            "turn answered without tools"
        );
        return Ok(state.finish(first.content));
    }

    state.advance(TurnPhase::ToolsRequested);
    let calls = first.tool_calls;
    info!(
        event_name = "turn.tools_requested",
        session_id = ctx.session_id,
        count = calls.len(),
        "model requested tools"
    );
    messages.push(Message::assistant_tool_calls(
        Some(first.content),
        calls.clone(),
    ));

    state.advance(TurnPhase::ExecutingTools);
    let mut traces = Vec::with_capacity(calls.len());
    for call in calls {
        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(fail(&mut state, ctx, TurnFault::Cancelled)),
            result = ctx.executor.execute(call.clone()) => result,
        };
        messages.push(Message::tool(
            result.tool_call_id.clone(),
            result.name.clone(),
            result.to_wire().to_string(),
        ));
        state.tool_calls.push(call.clone());
        state.tool_results.push(result.clone());
        traces.push(ToolTrace { call, result });
    }
    emit_tool_traces(&traces, ctx.session_id);

    state.advance(TurnPhase::AwaitModelFinal);
    let last = match guarded(ctx.cancel, ctx.llm.chat(messages, ctx.sampling)).await {
        Ok(resp) => resp,
        Err(err) => return Err(fail(&mut state, ctx, err)),
    };
    state.record_usage(&last.usage);

    if !last.tool_calls.is_empty() {
        let ignored: Vec<&str> = last.tool_calls.iter().map(|c| c.name.as_str()).collect();
        warn!(
            event_name = "turn.extra_tool_round_ignored",
            session_id = ctx.session_id,
            tools = ?ignored,
            "final model response requested more tools; ignoring"
        );
    }

    info!(
        event_name = "turn.completed",
        session_id = ctx.session_id,
        tools_used = true,
        tool_count = state.tool_results.len(),
        input_tokens = state.usage.input_tokens,
        output_tokens = state.usage.output_tokens,
        "turn answered after tool round"
    );
    Ok(state.finish(last.content))
}

enum TurnFault {
    Backend(AppError),
    Cancelled,
}

async fn guarded<F>(cancel: &CancellationToken, call: F) -> Result<LLMResponse, TurnFault>
where
    F: Future<Output = Result<LLMResponse, AppError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TurnFault::Cancelled),
        resp = call => resp.map_err(TurnFault::Backend),
    }
}

fn fail(state: &mut TurnState, ctx: &TurnContext<'_>, fault: TurnFault) -> AgentError {
    let from = state.phase;
    state.advance(TurnPhase::Failed);
    let err = match fault {
        TurnFault::Backend(e) => AgentError::ModelBackend(e.to_string()),
        TurnFault::Cancelled => AgentError::Cancelled,
    };
    warn!(
        event_name = "turn.failed",
        session_id = ctx.session_id,
        phase = from.as_str(),
        kind = err.kind(),
        error = %err,
        "turn failed"
    );
    err
}
