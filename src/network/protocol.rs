//! Wire types for the game server's JSON API

use crate::game::countdown::deserialize_deadline;
use crate::game::venns::PhraseChoice;
use crate::game::Millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Header carrying the session credential
pub const SESSION_HEADER: &str = "X-Session-Token";

/// Body of `add_player`
#[derive(Debug, Serialize)]
pub struct NewPlayer<'a> {
    pub game_id: &'a str,
    pub player_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<&'a str>,
}

/// Body of `start_game`
#[derive(Debug, Serialize)]
pub struct GameRef<'a> {
    pub game_id: &'a str,
}

/// Body of `assign_points`
#[derive(Debug, Serialize)]
pub struct PointsAward<'a> {
    pub points: i32,
    pub team: &'a str,
}

/// Body of `submit_phrase`
#[derive(Debug, Serialize)]
pub struct PhraseEntry<'a> {
    pub target_player_id: &'a str,
    pub phrase: &'a str,
}

/// Body of `vote_for_phrase`
#[derive(Debug, Serialize)]
pub struct Ballot<'a> {
    pub submission_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedGame {
    pub game_id: String,
}

/// One joinable game in the lobby list.
///
/// The phrase server sends `game_id` and a ready-made `label`; the Venns
/// server sends the raw game document (`game_id` or `id`, `players`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameListing {
    #[serde(alias = "id")]
    pub game_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub player_count: Option<usize>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
}

impl GameListing {
    /// Text shown in the lobby list
    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let short: String = self.game_id.chars().take(8).collect();
        match self.player_count.or(self.players.as_ref().map(Vec::len)) {
            Some(n) => format!("Game {} ({} players)", short, n),
            None => format!("Game {}", short),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameList {
    #[serde(default)]
    pub games: Vec<GameListing>,
}

/// Credentials issued when a player joins
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinGrant {
    pub player_id: String,
    pub session_token: String,
}

/// Card handed out by `start_turn` / `ready_turn`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TurnCard {
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default, rename = "turnEndTime", deserialize_with = "deserialize_deadline")]
    pub turn_end_time: Option<Millis>,
}

/// Reply to `assign_points`. No new card once the turn has expired.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoreUpdate {
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub expired: bool,
}

/// Reply to `end_turn`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnHandoff {
    #[serde(default)]
    pub next_player: Option<String>,
    #[serde(default)]
    pub next_team: Option<String>,
    #[serde(default)]
    pub next_player_name: Option<String>,
}

impl TurnHandoff {
    /// Best name for whoever plays next
    pub fn next_label(&self) -> &str {
        self.next_player_name
            .as_deref()
            .or(self.next_player.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionList {
    #[serde(default)]
    pub submissions: Vec<PhraseChoice>,
}

/// The `error` message of a reply, if it carries one
pub fn error_message(value: &Value) -> Option<String> {
    let error = value.as_object()?.get("error")?;
    Some(
        error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}
