use anyhow::Context;
use aster_trader::core::config::ExchangeConfig;
use aster_trader::{build_connector, CommandHandler};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

fn load_config() -> anyhow::Result<ExchangeConfig> {
    #[cfg(feature = "env-file")]
    let config = ExchangeConfig::from_env_file("ASTER");
    #[cfg(not(feature = "env-file"))]
    let config = ExchangeConfig::from_env("ASTER");
    config.context("loading ASTER_* configuration")
}

/// Reads one command per line from stdin and writes each reply to stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replies stay clean on stdout
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = load_config()?;
    info!(
        base_url = %config.base_url,
        symbol = %config.default_symbol,
        auth = ?config.auth_scheme(),
        "starting aster-trader"
    );

    let connector = build_connector(&config).context("building Aster connector")?;
    let handler = CommandHandler::new(Arc::new(connector), config.default_symbol.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = handler.handle(line).await;
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}
