//! Chat turn orchestration.
//!
//! # Module structure
//! - `turn` - Turn model (TurnId, TurnStatus, Turn)
//! - `accumulator` - Answer text accumulation and publishing
//! - `registry` - Per-turn dedup flags shared across a session
//! - `fallback` - Non-streaming fallback client and response normalization
//! - `supervisor` - Stall/timeout state machine driving one turn
//! - `session` - `ChatSession::submit` entry point

pub mod accumulator;
pub mod fallback;
pub mod registry;
pub mod session;
pub mod supervisor;
pub mod turn;

pub use accumulator::Accumulator;
pub use fallback::{extract_text, FallbackClient};
pub use registry::{DedupRegistry, TurnFlag};
pub use session::{ChatSession, SubmitRejected, TurnHandle};
pub use supervisor::{Supervisor, SupervisorPhase, TurnOutcome};
pub use turn::{AnswerSource, Turn, TurnId, TurnStatus};
