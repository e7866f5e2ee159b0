use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::provider::TokenUsage;
use crate::tools::definition::{ToolCall, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitModel,
    DirectAnswer,
    ToolsRequested,
    ExecutingTools,
    AwaitModelFinal,
    Done,
    Failed,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::AwaitModel => "await_model",
            TurnPhase::DirectAnswer => "direct_answer",
            TurnPhase::ToolsRequested => "tools_requested",
            TurnPhase::ExecutingTools => "executing_tools",
            TurnPhase::AwaitModelFinal => "await_model_final",
            TurnPhase::Done => "done",
            TurnPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Done | TurnPhase::Failed)
    }

    /// Edges of the single-round turn graph.
    pub fn can_advance_to(&self, next: TurnPhase) -> bool {
        use TurnPhase::*;
        match (self, next) {
            (_, Failed) => !self.is_terminal(),
            (AwaitModel, DirectAnswer | ToolsRequested) => true,
            (DirectAnswer, Done) => true,
            (ToolsRequested, ExecutingTools) => true,
            (ExecutingTools, AwaitModelFinal) => true,
            (AwaitModelFinal, Done) => true,
            _ => false,
        }
    }
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::AwaitModel
    }
}

/// Per-turn bookkeeping; lives only for one orchestration pass.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    pub phase: TurnPhase,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub usage: TokenUsage,
}

impl TurnState {
    pub fn advance(&mut self, next: TurnPhase) {
        if !self.phase.can_advance_to(next) {
            warn!(
                event_name = "turn.phase_unexpected",
                from = self.phase.as_str(),
                to = next.as_str(),
                "unexpected turn phase transition"
            );
        }
        debug!(
            event_name = "turn.phase",
            from = self.phase.as_str(),
            to = next.as_str(),
            "turn phase transition"
        );
        self.phase = next;
    }

    pub fn record_usage(&mut self, usage: &TokenUsage) {
        self.usage.add(usage);
    }

    pub fn finish(mut self, response: String) -> TurnOutcome {
        self.advance(TurnPhase::Done);
        TurnOutcome {
            response,
            tools_used: !self.tool_calls.is_empty(),
            tool_calls: self.tool_calls,
            tool_results: self.tool_results,
            usage: self.usage,
        }
    }
}

/// What a completed turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub tools_used: bool,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub usage: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::TurnPhase::*;

    #[test]
    fn single_round_graph() {
        assert!(AwaitModel.can_advance_to(ToolsRequested));
        assert!(AwaitModelFinal.can_advance_to(Done));
        assert!(!AwaitModelFinal.can_advance_to(ToolsRequested));
        assert!(!Done.can_advance_to(Failed));
        assert!(ExecutingTools.can_advance_to(Failed));
    }
}
