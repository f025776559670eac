use std::io::Write;
use std::sync::Arc;

use color_eyre::Result;
use flowchat::adapters::{ChannelSink, ReqwestHttpClient, TurnUpdate};
use flowchat::chat::{ChatSession, TurnOutcome};
use flowchat::cli::{parse_args, version_line, CliCommand, USAGE};
use flowchat::proxy;
use flowchat::startup::{init_logging, ProxyConfig};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    match parse_args(std::env::args()) {
        CliCommand::Version => println!("{}", version_line()),
        CliCommand::Help => print!("{}", USAGE),
        CliCommand::Serve => {
            init_logging();
            let config = ProxyConfig::from_env()?;
            proxy::serve(Arc::new(ReqwestHttpClient::new()), config).await?;
        }
        CliCommand::Ask(question) => {
            init_logging();
            if !run_ask(&question).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Run one turn, printing the answer as it streams in.
///
/// Returns false when the turn failed.
async fn run_ask(question: &str) -> Result<bool> {
    let (sink, mut rx) = ChannelSink::channel();
    let session = ChatSession::from_env(Arc::new(sink))?;
    let handle = session.submit(question)?;

    let mut stdout = std::io::stdout();
    let mut printed = 0;
    while let Some(update) = rx.recv().await {
        match update {
            TurnUpdate::Partial { text, .. } => {
                write!(stdout, "{}", text.get(printed..).unwrap_or_default())?;
                stdout.flush()?;
                printed = text.len();
            }
            TurnUpdate::Finalized { text, .. } => {
                let rest = if printed == 0 {
                    text.as_str()
                } else {
                    text.get(printed..).unwrap_or_default()
                };
                writeln!(stdout, "{}", rest)?;
                break;
            }
            TurnUpdate::Failed { kind, .. } => {
                if printed > 0 {
                    writeln!(stdout)?;
                }
                eprintln!("{}", kind.user_message());
                break;
            }
        }
    }

    Ok(matches!(handle.wait().await, TurnOutcome::Finalized { .. }))
}
