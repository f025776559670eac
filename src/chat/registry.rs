//! Per-turn dedup registry.
//!
//! One instance is created at session start and shared by every turn
//! supervisor. `try_acquire` is a single check-and-set under the lock, so
//! concurrent timers and the stream loop cannot both claim a flag.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::chat::turn::TurnId;

/// Flags tracked per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnFlag {
    /// The fallback request has been issued
    FallbackCalled,
    /// The stage deadline timer has been armed
    TimeoutArmed,
}

impl TurnFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnFlag::FallbackCalled => "fallback_called",
            TurnFlag::TimeoutArmed => "timeout_armed",
        }
    }
}

#[derive(Debug, Default)]
pub struct DedupRegistry {
    entries: Mutex<HashMap<TurnId, HashSet<TurnFlag>>>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TurnId, HashSet<TurnFlag>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set `flag` for `turn_id`. True only for the first caller.
    pub fn try_acquire(&self, turn_id: &TurnId, flag: TurnFlag) -> bool {
        self.entries()
            .entry(turn_id.clone())
            .or_default()
            .insert(flag)
    }

    pub fn is_set(&self, turn_id: &TurnId, flag: TurnFlag) -> bool {
        self.entries()
            .get(turn_id)
            .map(|flags| flags.contains(&flag))
            .unwrap_or(false)
    }

    /// Forget every flag of `turn_id`.
    pub fn release(&self, turn_id: &TurnId) {
        self.entries().remove(turn_id);
    }

    /// Number of turns with at least one flag.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_caller_wins() {
        let registry = DedupRegistry::new();
        let id = TurnId::from("t1");
        assert!(registry.try_acquire(&id, TurnFlag::FallbackCalled));
        assert!(!registry.try_acquire(&id, TurnFlag::FallbackCalled));
        assert!(registry.is_set(&id, TurnFlag::FallbackCalled));
    }

    #[test]
    fn test_flags_are_independent() {
        let registry = DedupRegistry::new();
        let id = TurnId::from("t1");
        assert!(registry.try_acquire(&id, TurnFlag::TimeoutArmed));
        assert!(registry.try_acquire(&id, TurnFlag::FallbackCalled));
        assert!(registry.try_acquire(&TurnId::from("t2"), TurnFlag::FallbackCalled));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_release_clears_turn() {
        let registry = DedupRegistry::new();
        let id = TurnId::from("t1");
        registry.try_acquire(&id, TurnFlag::FallbackCalled);
        registry.release(&id);
        assert!(registry.is_empty());
        assert!(!registry.is_set(&id, TurnFlag::FallbackCalled));
    }

    #[test]
    fn test_concurrent_acquire_has_one_winner() {
        let registry = Arc::new(DedupRegistry::new());
        let id = TurnId::from("race");
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let id = id.clone();
                std::thread::spawn(move || registry.try_acquire(&id, TurnFlag::FallbackCalled))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
