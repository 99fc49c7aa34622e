//! Command-line and environment configuration

use crate::game::StartPolicy;
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Which game the client plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Team phrase-guessing game
    Phrase,
    /// Word-association game
    Venns,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Phrase => "phrase",
            Variant::Venns => "venns",
        }
    }

    /// Lobby list refresh interval used when none is configured
    pub fn default_lobby_poll(&self) -> Duration {
        match self {
            Variant::Phrase => Duration::from_millis(3000),
            Variant::Venns => Duration::from_millis(5000),
        }
    }

    /// Whether players pick a team when joining
    pub fn has_teams(&self) -> bool {
        matches!(self, Variant::Phrase)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Variant::Phrase => "Phrase Game",
            Variant::Venns => "Venns",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Terminal client for the phrase and Venns party games")]
pub struct Args {
    /// Game server base URL
    #[arg(long, env = "HUDDLE_SERVER", default_value = "http://127.0.0.1:8080")]
    pub server: String,

    /// Which game to play
    #[arg(long, env = "HUDDLE_VARIANT", value_enum, default_value_t = Variant::Phrase)]
    pub variant: Variant,

    /// Who may start a waiting game
    #[arg(long, value_enum, default_value_t = StartPolicy::CreatorOnly)]
    pub start_policy: StartPolicy,

    /// Delay between game snapshot polls, counted from the previous reply
    #[arg(long, default_value_t = 2000)]
    pub poll_ms: u64,

    /// Lobby game list refresh interval (3000 for phrase, 5000 for Venns)
    #[arg(long)]
    pub lobby_poll_ms: Option<u64>,

    /// UI redraw interval; keeps the countdown moving between polls
    #[arg(long, default_value_t = 250)]
    pub tick_ms: u64,

    /// Per-request timeout
    #[arg(long, default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Directory for the database and log file (defaults to the OS data directory)
    #[arg(long, env = "HUDDLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level written to huddle.log
    #[arg(long, env = "HUDDLE_LOG", default_value = "info")]
    pub log_level: tracing::Level,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub variant: Variant,
    pub start_policy: StartPolicy,
    pub game_poll: Duration,
    pub lobby_poll: Duration,
    pub tick: Duration,
    pub request_timeout: Duration,
    pub data_dir: Option<PathBuf>,
    pub log_level: tracing::Level,
}

pub fn build_config(args: &Args) -> Result<Config> {
    let server_url = args.server.trim().trim_end_matches('/').to_string();
    if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
        bail!("server must be an http:// or https:// URL, got {:?}", args.server);
    }

    for (name, value) in [
        ("poll_ms", Some(args.poll_ms)),
        ("lobby_poll_ms", args.lobby_poll_ms),
        ("tick_ms", Some(args.tick_ms)),
        ("request_timeout_ms", Some(args.request_timeout_ms)),
    ] {
        if value == Some(0) {
            bail!("{} must be greater than zero", name);
        }
    }

    Ok(Config {
        server_url,
        variant: args.variant,
        start_policy: args.start_policy,
        game_poll: Duration::from_millis(args.poll_ms),
        lobby_poll: args
            .lobby_poll_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| args.variant.default_lobby_poll()),
        tick: Duration::from_millis(args.tick_ms),
        request_timeout: Duration::from_millis(args.request_timeout_ms),
        data_dir: args.data_dir.clone(),
        log_level: args.log_level,
    })
}
