//! Agent-flow lifecycle event parsers

use serde_json::Value;

use crate::sse::events::StreamEvent;
use crate::sse::payloads::{AgentFlowPayload, STATUS_FINISHED, STATUS_IN_PROGRESS};

/// Parse `{status, nodeLabel}` into a stage marker.
///
/// Payloads without that shape, or with any other status, are not stage
/// markers.
pub(super) fn parse_agent_flow_event(payload: &Value) -> Option<StreamEvent> {
    let flow: AgentFlowPayload = serde_json::from_value(payload.clone()).ok()?;
    match flow.status.as_str() {
        STATUS_IN_PROGRESS => Some(StreamEvent::StageStarted(flow.node_label)),
        STATUS_FINISHED => Some(StreamEvent::StageEnded(flow.node_label)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_progress_is_stage_started() {
        let payload = json!({"status": "INPROGRESS", "nodeLabel": "Agent"});
        assert_eq!(
            parse_agent_flow_event(&payload),
            Some(StreamEvent::StageStarted("Agent".to_string()))
        );
    }

    #[test]
    fn test_finished_is_stage_ended() {
        let payload = json!({"status": "FINISHED", "nodeLabel": "Agent", "nodeId": "a_0"});
        assert_eq!(
            parse_agent_flow_event(&payload),
            Some(StreamEvent::StageEnded("Agent".to_string()))
        );
    }

    #[test]
    fn test_other_status_or_shape() {
        assert_eq!(
            parse_agent_flow_event(&json!({"status": "ERROR", "nodeLabel": "Agent"})),
            None
        );
        assert_eq!(parse_agent_flow_event(&json!("INPROGRESS")), None);
        assert_eq!(parse_agent_flow_event(&json!({"status": "FINISHED"})), None);
    }
}
