//! mebel-chat: terminal client for the marketplace chat endpoint.
//!
//! Joins one conversation over the signaling channel, prints what arrives
//! and sends what is typed. Useful for poking at the realtime backend
//! without a browser.

mod command;
mod session;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use mebel_common::{ConfigError, MebelError, UserId};
use mebel_config::{toml_loader, validation, MebelConfig};
use mebel_realtime::{ChatRoom, TypingDebounce};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::session::ChatSession;

#[derive(Parser)]
#[command(name = "mebel-chat", about = "Terminal client for the mebel chat endpoint")]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint, overrides `realtime.url`.
    #[arg(long)]
    url: Option<String>,

    /// Access token, overrides `realtime.access_token`.
    #[arg(long)]
    token: Option<String>,

    /// Conversation to join.
    #[arg(long)]
    chat: String,

    /// Our participant id.
    #[arg(long)]
    user: String,

    /// Other participants; repeat for each.
    #[arg(long = "participant")]
    participants: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), MebelError> {
    let args = Args::parse();
    let (mut config, fallback) = load_config(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = fallback {
        warn!(error = %e, "Could not load default config, using built-in defaults");
    }

    if let Some(url) = args.url {
        config.realtime.url = url;
    }
    if let Some(token) = args.token {
        config.realtime.access_token = Some(token);
    }
    validation::validate(&config)?;

    let user = UserId::new(args.user);
    let mut participants: Vec<UserId> = args.participants.into_iter().map(UserId::new).collect();
    if !participants.contains(&user) {
        participants.insert(0, user.clone());
    }

    let channel_config = settings::channel_config(&config.realtime);
    let call_options = settings::call_options(&config.call);
    let room = ChatRoom::new(
        args.chat,
        user,
        participants,
        settings::room_config(&config.chat),
    );
    let typing = TypingDebounce::new(config.chat.typing_timeout());

    tracing::info!(
        chat_id = %room.chat_id(),
        user = %room.user_id(),
        participants = room.participants().len(),
        "mebel-chat starting"
    );

    ChatSession::start(channel_config, room, typing, call_options)
        .run()
        .await?;
    Ok(())
}

/// Explicit paths must exist; the default path is created on first run and
/// falls back to built-in defaults if that fails. The fallback error is
/// handed back so it can be logged once tracing is up.
fn load_config(
    path: Option<&std::path::Path>,
) -> Result<(MebelConfig, Option<ConfigError>), MebelError> {
    match path {
        Some(path) => Ok((toml_loader::load_from_path(path)?, None)),
        None => Ok(or_default(toml_loader::load_default())),
    }
}

fn or_default(loaded: Result<MebelConfig, ConfigError>) -> (MebelConfig, Option<ConfigError>) {
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (MebelConfig::default(), Some(e)),
    }
}
