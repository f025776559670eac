//! Answer-text event parsers

use serde_json::Value;

use crate::sse::events::StreamEvent;
use crate::sse::payloads::TextPayload;

/// `token` carries a bare string; any other payload shape is not a token.
pub(super) fn parse_token_event(payload: &Value) -> Option<StreamEvent> {
    payload.as_str().map(|s| StreamEvent::Token(s.to_string()))
}

/// `agentResponse` / `finalResponse` carry either a string or `{"text": ...}`.
pub(super) fn parse_text_channel(payload: &Value) -> Option<String> {
    if let Some(s) = payload.as_str() {
        return Some(s.to_string());
    }
    serde_json::from_value::<TextPayload>(payload.clone())
        .ok()
        .map(|p| p.text)
}
