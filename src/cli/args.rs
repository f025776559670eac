//! Command-line argument parsing for the flowchat CLI.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run the HTTP proxy
    Serve,
    /// Run a single turn and print the answer
    Ask(String),
}

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: flowchat <command>

Commands:
  serve             Run the chat proxy (FLOWISE_URL, FLOWCHAT_BIND)
  ask <question>    Ask one question through the streaming endpoint

Options:
  -h, --help        Print help
  -V, --version     Print version
";

/// Parse command-line arguments into a command.
///
/// The first argument is the program name. Flags win over subcommands;
/// anything unrecognized, or nothing at all, shows help.
///
/// # Examples
///
/// ```
/// use flowchat::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["flowchat".to_string(), "ask".to_string(), "hi".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Ask("hi".to_string()));
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let args: Vec<String> = args.skip(1).collect();

    for arg in &args {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            _ => {}
        }
    }

    match args.first().map(String::as_str) {
        Some("serve") => CliCommand::Serve,
        Some("ask") => {
            let question = args[1..].join(" ");
            if question.trim().is_empty() {
                CliCommand::Help
            } else {
                CliCommand::Ask(question)
            }
        }
        _ => CliCommand::Help,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        parse_args(
            std::iter::once("flowchat")
                .chain(args.iter().copied())
                .map(String::from),
        )
    }

    #[test]
    fn test_parse_version_flags() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V"]), CliCommand::Version);
        assert_eq!(parse(&["serve", "-V"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse(&[]), CliCommand::Help);
        assert_eq!(parse(&["-h"]), CliCommand::Help);
        assert_eq!(parse(&["frobnicate"]), CliCommand::Help);
    }

    #[test]
    fn test_parse_serve() {
        assert_eq!(parse(&["serve"]), CliCommand::Serve);
    }

    #[test]
    fn test_parse_ask_joins_words() {
        assert_eq!(
            parse(&["ask", "what", "is", "rust?"]),
            CliCommand::Ask("what is rust?".to_string())
        );
    }

    #[test]
    fn test_parse_ask_without_question() {
        assert_eq!(parse(&["ask"]), CliCommand::Help);
        assert_eq!(parse(&["ask", " "]), CliCommand::Help);
    }
}
