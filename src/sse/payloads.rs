//! SSE payload deserialization structs
//!
//! Internal structs used to deserialize the `data` member of agent-flow
//! event envelopes.

use serde::Deserialize;

/// `nextAgentFlow` / `agentFlowEvent` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AgentFlowPayload {
    pub status: String,
    #[serde(rename = "nodeLabel")]
    pub node_label: String,
}

/// Agent-flow lifecycle status values.
pub(crate) const STATUS_IN_PROGRESS: &str = "INPROGRESS";
pub(crate) const STATUS_FINISHED: &str = "FINISHED";

/// Object form of `agentResponse` / `finalResponse` payloads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextPayload {
    pub text: String,
}
