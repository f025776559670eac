//! CLI module for flowchat.
//!
//! ```ignore
//! use flowchat::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Serve => { /* run the proxy */ }
//!     CliCommand::Ask(question) => { /* run one turn */ }
//!     CliCommand::Version | CliCommand::Help => { /* print and exit */ }
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use version::{version_line, VERSION};
