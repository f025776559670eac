//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (POST, streaming POST)
//! - [`TurnSink`] - Presentation-layer callbacks for a chat turn

pub mod http;
pub mod sink;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
pub use sink::TurnSink;
