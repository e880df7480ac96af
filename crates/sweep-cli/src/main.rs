use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use sweep_api::{ApiClient, HttpTransport};
use sweep_core::{Runner, TracingObserver};
use sweep_types::config::{ReplaceMode, ReplacePolicy, RunConfig};
use sweep_types::models::{Credential, RoomKind, RoomRef, TokenKind};

const DEFAULT_API_URL: &str = "https://discord.com/api/v6";

/// Bulk-delete one author's messages in a channel or guild.
#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(version)]
struct Cli {
    /// Bot/user token. Prompted for on stdin when not given.
    #[arg(long, env = "SWEEP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Token type: Bot, Bearer or User
    #[arg(long, env = "SWEEP_TOKEN_TYPE", default_value = "User")]
    token_type: TokenKind,

    /// The room to search in
    #[arg(long)]
    room_id: u64,

    /// channel or guild
    #[arg(long)]
    room_type: RoomKind,

    /// Author whose messages are deleted
    #[arg(long)]
    author_id: u64,

    /// Newest message ID to delete (not checked for existence)
    #[arg(long)]
    newest_message_id: u64,

    /// Oldest message ID to delete (not checked for existence)
    #[arg(long)]
    oldest_message_id: u64,

    /// Overwrite messages before deleting them: random, fixed or none
    #[arg(long, default_value = "none")]
    replace_before_delete: ReplaceMode,

    /// Replacement text when --replace-before-delete is fixed
    #[arg(long)]
    replace_to: Option<String>,

    /// Sleep before every request, in seconds
    #[arg(long, env = "SWEEP_DEFAULT_SLEEP", default_value_t = 0.0)]
    default_sleep: f64,

    /// Base URL of the API
    #[arg(long, env = "SWEEP_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, env = "SWEEP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sweep=info,sweep_core=info,sweep_api=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let default_sleep = parse_default_sleep(cli.default_sleep)?;

    let token = match cli.token {
        Some(token) => token,
        None => prompt_token()?,
    };
    let credential = Credential::new(token, cli.token_type);

    let replace = ReplacePolicy::from_mode(cli.replace_before_delete, cli.replace_to)?;
    let config = RunConfig::new(
        RoomRef::new(cli.room_type, cli.room_id),
        cli.author_id,
        cli.oldest_message_id,
        cli.newest_message_id,
        replace,
    )?;

    let transport = HttpTransport::new(
        &cli.api_url,
        &credential,
        Duration::from_secs(cli.timeout_secs),
    )?;
    let client = ApiClient::new(transport, default_sleep);

    info!(api_url = %cli.api_url, token_type = %credential.kind(), "Sweeper configured");

    let mut runner = Runner::new(&client, config, Arc::new(TracingObserver));
    runner.run().await?;

    Ok(())
}

fn parse_default_sleep(secs: f64) -> anyhow::Result<Duration> {
    if secs < 0.0 {
        bail!("--default-sleep must be a non-negative number of seconds");
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--default-sleep {} is not a usable number of seconds", secs))
}

fn prompt_token() -> anyhow::Result<String> {
    eprint!("Token: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read token from stdin")?;

    let token = line.trim().to_string();
    if token.is_empty() {
        bail!("A token is required (--token, SWEEP_TOKEN or stdin)");
    }
    Ok(token)
}
