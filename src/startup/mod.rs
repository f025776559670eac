//! Startup: configuration and logging.
//!
//! # Components
//!
//! - [`config`] - `ChatConfig` and `ProxyConfig`, read from the environment
//! - [`logging`] - tracing subscriber setup
//!
//! # Usage
//!
//! ```ignore
//! use flowchat::startup::{init_logging, ChatConfig};
//!
//! init_logging();
//! let config = ChatConfig::from_env()?;
//! ```

pub mod config;
pub mod logging;

pub use config::{ChatConfig, ProxyConfig};
pub use logging::init_logging;
