//! flowchat - streaming chat client and proxy for a hosted agent flow
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod chat;
pub mod cli;
pub mod error;
pub mod proxy;
pub mod sse;
pub mod startup;
pub mod traits;
