//! Answer accumulator.
//!
//! Owns the growing answer text of one turn and publishes every change to
//! the sink. Once sealed it drops further input silently.

use std::sync::Arc;

use crate::chat::turn::TurnId;
use crate::traits::TurnSink;

pub struct Accumulator {
    turn_id: TurnId,
    text: String,
    sealed: bool,
    sink: Arc<dyn TurnSink>,
}

impl Accumulator {
    pub fn new(turn_id: TurnId, sink: Arc<dyn TurnSink>) -> Self {
        Self {
            turn_id,
            text: String::new(),
            sealed: false,
            sink,
        }
    }

    /// Append `chunk` and publish the full text.
    ///
    /// Returns false when nothing was published: the chunk was empty or the
    /// accumulator is sealed.
    pub fn append(&mut self, chunk: &str) -> bool {
        if self.sealed || chunk.is_empty() {
            return false;
        }
        self.text.push_str(chunk);
        self.sink.on_update(&self.turn_id, &self.text);
        true
    }

    /// Stop accepting input.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("turn_id", &self.turn_id)
            .field("len", &self.text.len())
            .field("sealed", &self.sealed)
            .finish()
    }
}
