use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monica_proxy::app::App;
use monica_proxy::catalog;
use monica_proxy::models::ChatCompletionRequest;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "monica-proxy")]
#[command(about = "Translate OpenAI chat requests into Monica bot requests")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the OpenAI-compatible model list.
    Models,
    /// Translate a chat-completion request read from a file (or `-` for stdin).
    Translate {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Target a custom bot instead of the model catalog.
        #[arg(long)]
        bot_uid: Option<String>,
        /// Dispatch the translated request and stream the raw response to stdout.
        #[arg(long)]
        send: bool,
    },
}

fn read_request(input: &Path) -> Result<ChatCompletionRequest> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };
    serde_json::from_str(&raw).context("Invalid chat-completion request")
}

async fn translate(input: PathBuf, bot_uid: Option<String>, send: bool) -> Result<()> {
    let app = App::new()?;
    let request = read_request(&input)?;

    let translated = match bot_uid.as_deref() {
        Some(bot_uid) => app.translate_for(&request, Some(bot_uid)).await?,
        None => app.translate(&request).await?,
    };

    if !send {
        println!("{}", serde_json::to_string_pretty(&translated)?);
        return Ok(());
    }

    let mut response = app.send(&translated).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = response.chunk().await? {
        stdout.write_all(&chunk)?;
        stdout.flush()?;
    }
    info!("Response stream finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monica_proxy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let result = match args.command {
        Command::Models => {
            println!("{}", serde_json::to_string_pretty(&catalog::model_list())?);
            Ok(())
        }
        Command::Translate {
            input,
            bot_uid,
            send,
        } => translate(input, bot_uid, send).await,
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translate_args() {
        let args =
            CliArgs::try_parse_from(["monica-proxy", "translate", "req.json", "--bot-uid", "b1"])
                .unwrap();
        match args.command {
            Command::Translate {
                input,
                bot_uid,
                send,
            } => {
                assert_eq!(input, PathBuf::from("req.json"));
                assert_eq!(bot_uid.as_deref(), Some("b1"));
                assert!(!send);
            }
            Command::Models => panic!("expected translate"),
        }
    }

    #[test]
    fn test_translate_requires_input() {
        assert!(CliArgs::try_parse_from(["monica-proxy", "translate"]).is_err());
    }
}
