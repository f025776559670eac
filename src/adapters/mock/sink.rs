//! Recording turn sink for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::chat::TurnId;
use crate::error::FailureKind;
use crate::traits::TurnSink;

/// One recorded sink callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Streaming(TurnId),
    Update(TurnId, String),
    Finalized(TurnId, String),
    Failed(TurnId, FailureKind),
}

/// Sink that records every callback in arrival order.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn events_mut(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All callbacks so far.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events_mut().clone()
    }

    /// Texts of `on_update` calls, in order.
    pub fn updates(&self) -> Vec<String> {
        self.events_mut()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Update(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of `on_finalized` calls, in order.
    pub fn finalized(&self) -> Vec<String> {
        self.events_mut()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Finalized(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Kinds of `on_failed` calls, in order.
    pub fn failures(&self) -> Vec<FailureKind> {
        self.events_mut()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Failed(_, kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal callbacks (finalized or failed).
    pub fn terminal_count(&self) -> usize {
        self.events_mut()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Finalized(..) | SinkEvent::Failed(..)))
            .count()
    }

    /// Whether `on_streaming` was called.
    pub fn saw_streaming(&self) -> bool {
        self.events_mut()
            .iter()
            .any(|e| matches!(e, SinkEvent::Streaming(_)))
    }
}

impl TurnSink for RecordingSink {
    fn on_streaming(&self, turn_id: &TurnId) {
        self.events_mut().push(SinkEvent::Streaming(turn_id.clone()));
    }

    fn on_update(&self, turn_id: &TurnId, text: &str) {
        self.events_mut()
            .push(SinkEvent::Update(turn_id.clone(), text.to_string()));
    }

    fn on_finalized(&self, turn_id: &TurnId, text: &str) {
        self.events_mut()
            .push(SinkEvent::Finalized(turn_id.clone(), text.to_string()));
    }

    fn on_failed(&self, turn_id: &TurnId, kind: FailureKind) {
        self.events_mut()
            .push(SinkEvent::Failed(turn_id.clone(), kind));
    }
}
