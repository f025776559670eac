//! Presentation-layer callback interface.
//!
//! The supervisor is the only caller. For one turn it guarantees:
//! `on_streaming` comes first if the primary stream opens, `on_update` calls
//! carry cumulative text in order, and exactly one of `on_finalized` /
//! `on_failed` follows them. Nothing is delivered after that.

use crate::chat::TurnId;
use crate::error::FailureKind;

/// Receives the observable lifecycle of chat turns.
pub trait TurnSink: Send + Sync {
    /// The primary stream opened. Not called when the turn never gets one.
    fn on_streaming(&self, _turn_id: &TurnId) {}

    /// The accumulated answer grew; `text` is the full answer so far.
    fn on_update(&self, turn_id: &TurnId, text: &str);

    /// The turn completed with `text` as its final answer.
    fn on_finalized(&self, turn_id: &TurnId, text: &str);

    /// The turn failed; render `kind.user_message()` in place of an answer.
    fn on_failed(&self, turn_id: &TurnId, kind: FailureKind);
}
