//! Event classification
//!
//! Maps one raw data string to a `StreamEvent`. Classification is pure: it
//! never logs and never touches turn state.

mod agent_flow;
mod content;

use serde_json::Value;

use crate::sse::events::{SseParseError, StreamEvent};

use agent_flow::parse_agent_flow_event;
use content::{parse_text_channel, parse_token_event};

/// Parse one data string into a classified event.
///
/// Returns an error only when the data is not a JSON object; unknown event
/// names and unexpected payload shapes classify as `StreamEvent::Unknown`.
pub fn parse_event(data: &str) -> Result<StreamEvent, SseParseError> {
    let envelope: Value = serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
        data: data.to_string(),
        source: e.to_string(),
    })?;

    if !envelope.is_object() {
        return Err(SseParseError::NotAnEnvelope {
            data: data.to_string(),
        });
    }

    // Older page variants keyed the discriminator as "type"
    let name = envelope
        .get("event")
        .or_else(|| envelope.get("type"))
        .and_then(Value::as_str);
    let payload = envelope.get("data").unwrap_or(&Value::Null);

    let event = match name {
        Some("token") => parse_token_event(payload),
        Some("nextAgentFlow") | Some("agentFlowEvent") => parse_agent_flow_event(payload),
        Some("agentResponse") => parse_text_channel(payload).map(StreamEvent::AgentText),
        Some("finalResponse") => parse_text_channel(payload).map(StreamEvent::FinalText),
        Some("end") => Some(StreamEvent::End),
        _ => None,
    };

    Ok(event.unwrap_or(StreamEvent::Unknown))
}

/// Classify a data string, folding parse failures into `Unknown`.
pub fn classify(data: &str) -> StreamEvent {
    parse_event(data).unwrap_or(StreamEvent::Unknown)
}
