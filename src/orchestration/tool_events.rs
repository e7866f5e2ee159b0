use tracing::{info, warn};

use crate::tools::definition::{ToolOutcome, ToolTrace};

const PREVIEW_CHARS: usize = 200;

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => {
            let mut out = s[..cut].to_string();
            out.push('…');
            out
        }
    }
}

fn status(outcome: &ToolOutcome) -> &'static str {
    match outcome {
        ToolOutcome::Success { .. } => "ok",
        ToolOutcome::NotFound => "not_found",
        ToolOutcome::Unsatisfied { .. } => "unsatisfied",
        ToolOutcome::Rejected { .. } => "rejected",
        ToolOutcome::Fault { .. } => "fault",
    }
}

/// One call event and one result event per invocation, in execution order.
pub fn emit_tool_traces(traces: &[ToolTrace], session_id: &str) {
    for (index, t) in traces.iter().enumerate() {
        info!(
            event_name = "tool.call",
            session_id,
            index,
            tool_name = %t.call.name,
            tool_call_id = %t.call.id,
            arguments = %truncate(&t.call.arguments.to_string(), PREVIEW_CHARS),
            "CALL {}",
            t.call.name
        );

        let result = &t.result;
        let output = truncate(&result.to_wire().to_string(), PREVIEW_CHARS);
        match result.error_detail() {
            Some(detail) => warn!(
                event_name = "tool.result",
                session_id,
                index,
                tool_name = %result.name,
                tool_call_id = %result.tool_call_id,
                status = status(&result.outcome),
                duration_ms = result.duration_ms,
                error = %detail,
                output = %output,
                "ERROR {}",
                result.name
            ),
            None => info!(
                event_name = "tool.result",
                session_id,
                index,
                tool_name = %result.name,
                tool_call_id = %result.tool_call_id,
                status = status(&result.outcome),
                duration_ms = result.duration_ms,
                output = %output,
                "{} {}",
                if result.success() { "OK" } else { "SOFT_FAIL" },
                result.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("éééé", 2), "éé…");
    }
}
