//! Channel-backed turn sink.
//!
//! Forwards sink callbacks as `TurnUpdate` messages so a UI task can consume
//! them from its own loop.

use tokio::sync::mpsc;
use tracing::debug;

use crate::chat::TurnId;
use crate::error::FailureKind;
use crate::traits::TurnSink;

/// Message form of the `TurnSink` callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnUpdate {
    Partial { turn_id: TurnId, text: String },
    Finalized { turn_id: TurnId, text: String },
    Failed { turn_id: TurnId, kind: FailureKind },
}

impl TurnUpdate {
    pub fn turn_id(&self) -> &TurnId {
        match self {
            TurnUpdate::Partial { turn_id, .. }
            | TurnUpdate::Finalized { turn_id, .. }
            | TurnUpdate::Failed { turn_id, .. } => turn_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnUpdate::Partial { .. })
    }
}

/// `TurnSink` that sends every callback over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TurnUpdate>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<TurnUpdate>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TurnUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, update: TurnUpdate) {
        if self.tx.send(update).is_err() {
            debug!("Turn update dropped: receiver closed");
        }
    }
}

impl TurnSink for ChannelSink {
    fn on_update(&self, turn_id: &TurnId, text: &str) {
        self.send(TurnUpdate::Partial {
            turn_id: turn_id.clone(),
            text: text.to_string(),
        });
    }

    fn on_finalized(&self, turn_id: &TurnId, text: &str) {
        self.send(TurnUpdate::Finalized {
            turn_id: turn_id.clone(),
            text: text.to_string(),
        });
    }

    fn on_failed(&self, turn_id: &TurnId, kind: FailureKind) {
        self.send(TurnUpdate::Failed {
            turn_id: turn_id.clone(),
            kind,
        });
    }
}
