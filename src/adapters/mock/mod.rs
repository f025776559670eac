//! Mock implementations for testing.
//!
//! - [`MockHttpClient`] - HTTP client with scripted, delayed or hanging responses
//! - [`RecordingSink`] - Turn sink that records every callback

pub mod http;
pub mod sink;

pub use http::{MockHttpClient, MockResponse, RecordedRequest, StreamStep};
pub use sink::{RecordingSink, SinkEvent};
