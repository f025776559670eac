//! HTTP proxy in front of the hosted agent.
//!
//! Routes:
//! - `POST /api/chat` - streaming prediction, SSE passed through
//! - `POST /api/chat-fallback` - non-streaming prediction, JSON
//! - `GET /health` - liveness

pub mod error;
pub mod server;

pub use error::ProxyError;
pub use server::{router, serve, start_proxy_server_on, ProxyState};
