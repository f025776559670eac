//! Agent-flow SSE stream decoding
//!
//! The agent streams `text/event-stream` frames whose `data:` lines carry a
//! JSON envelope `{"event": <name>, "data": <payload>}`.
//!
//! # Module structure
//! - `decoder` - Incremental byte-to-frame decoding (FrameDecoder, data_frames)
//! - `events` - Event type definitions (StreamEvent, SseParseError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Classification logic (parse_event, classify)

mod decoder;
mod events;
mod parser;
mod payloads;

// Re-export public types
pub use decoder::{data_frames, FrameDecoder, DONE_SENTINEL};
pub use events::{SseParseError, StreamEvent};
pub use parser::{classify, parse_event};
