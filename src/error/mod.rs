//! Error handling for flowchat.
//!
//! - **Error Categories**: decide whether an error is absorbed or surfaced
//! - **Domain-specific Errors**: Network, Stream and Config errors
//! - **Unified Error Type**: `ChatError` consolidates them
//! - **Failure Kinds**: what `on_failed` reports to the presentation layer
//!
//! # Error Categories
//!
//! | Category | Source | Handling | User visible |
//! |----------|--------|----------|--------------|
//! | Network | primary/fallback transport | fall back / fail turn | No |
//! | Protocol | malformed frame | drop frame | No |
//! | Timeout | stalled stream | fall back | No |
//! | Configuration | missing endpoint | fatal | Yes |
//! | EmptyResult | nothing from either path | fail turn | Yes |

mod category;
mod chat_error;
mod config;
mod network;
mod result;
mod stream;

pub use category::ErrorCategory;
pub use chat_error::{ChatError, FailureKind, GENERIC_FAILURE_MESSAGE};
pub use config::ConfigError;
pub use network::NetworkError;
pub use result::ChatResult;
pub use stream::StreamError;
