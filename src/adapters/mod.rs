//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`ChannelSink`] - Turn sink forwarding into a tokio channel
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::RecordingSink`] - Records sink callbacks

pub mod channel_sink;
pub mod mock;
pub mod reqwest_http;

pub use channel_sink::{ChannelSink, TurnUpdate};
pub use mock::{MockHttpClient, RecordingSink};
pub use reqwest_http::ReqwestHttpClient;
