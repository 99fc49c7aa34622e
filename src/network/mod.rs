//! Networking: the game server contract, its HTTP implementation, the
//! background request worker and poll scheduling
//!
//! This module provides:
//! - `GameServer`, the calls the client makes against a game server
//! - `HttpGameServer`, a blocking reqwest implementation of it
//! - `Worker`, a thread that runs requests off the UI thread
//! - `PollSchedule`, start/stop poll timers driven by explicit clock readings

pub mod client;
pub mod protocol;
pub mod schedule;
pub mod worker;

pub use client::HttpGameServer;
pub use protocol::{CreatedGame, GameListing, JoinGrant, ScoreUpdate, TurnCard, TurnHandoff};
pub use schedule::PollSchedule;
pub use worker::{Completion, Job, Purpose, Reply, Request, Ticket, Worker};

use crate::game::venns::PhraseChoice;
use serde_json::Value;
use thiserror::Error;

/// Error type for game server calls.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server could not be reached or the exchange broke off
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with an `error` payload
    #[error("{0}")]
    Application(String),
    /// The server answered with JSON we did not expect
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Non-success status without an error payload
    #[error("failed: {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

impl ClientError {
    /// Transport failures heal on the next scheduled poll
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// Result type for game server calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Everything the client asks of a game server.
///
/// Calls taking a `token` authenticate with the session credential issued
/// by `add_player`.
pub trait GameServer: Send {
    fn create_game(&self) -> Result<CreatedGame>;

    fn list_games(&self) -> Result<Vec<GameListing>>;

    /// The raw snapshot. Error payloads are returned as-is so the view can
    /// tell an unavailable game from a network failure.
    fn get_game(&self, game_id: &str) -> Result<Value>;

    fn add_player(&self, game_id: &str, player_name: &str, team: Option<&str>) -> Result<JoinGrant>;

    fn start_game(&self, game_id: &str) -> Result<()>;

    fn start_turn(&self, token: &str) -> Result<TurnCard>;

    fn ready_turn(&self, token: &str) -> Result<TurnCard>;

    fn assign_points(&self, token: &str, points: i32, team: &str) -> Result<ScoreUpdate>;

    fn end_turn(&self, token: &str) -> Result<TurnHandoff>;

    fn submit_phrase(&self, token: &str, target_player_id: &str, phrase: &str) -> Result<()>;

    fn start_next_round(&self, token: &str) -> Result<()>;

    fn submissions_for_player(&self, token: &str) -> Result<Vec<PhraseChoice>>;

    fn vote_for_phrase(&self, token: &str, submission_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ClientError::Transport("refused".to_string()).is_transport());
        assert!(!ClientError::Application("Not your turn".to_string()).is_transport());
    }

    #[test]
    fn test_application_error_displays_message() {
        let e = ClientError::Application("Invalid or missing session token".to_string());
        assert_eq!(e.to_string(), "Invalid or missing session token");
    }
}
