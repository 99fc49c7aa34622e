//! HTTP client for the game server

use super::protocol::{
    error_message, Ballot, CreatedGame, GameList, GameListing, GameRef, JoinGrant, NewPlayer,
    PhraseEntry, PointsAward, ScoreUpdate, SubmissionList, TurnCard, TurnHandoff, SESSION_HEADER,
};
use super::{ClientError, GameServer, Result};
use crate::game::venns::PhraseChoice;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// A game server reached over HTTP
pub struct HttpGameServer {
    http: Client,
    base_url: String,
}

impl HttpGameServer {
    /// Build a client for the server at `base_url` (e.g. "http://127.0.0.1:8080")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidScheme(base_url));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(format!("{}{}", self.base_url, path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(format!("{}{}", self.base_url, path))
    }

    fn post_as(&self, path: &str, token: &str) -> RequestBuilder {
        self.post(path).header(SESSION_HEADER, token)
    }

    /// Send the request and read the reply body as JSON, whatever the status
    fn exchange(&self, request: RequestBuilder) -> Result<(StatusCode, Value)> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        debug!("{} <- {} bytes", status, body.len());

        if body.trim().is_empty() {
            return Ok((status, Value::Null));
        }
        match serde_json::from_str(&body) {
            Ok(value) => Ok((status, value)),
            Err(_) if !status.is_success() => Err(ClientError::Status(status)),
            Err(e) => Err(ClientError::Decode(e)),
        }
    }

    /// Send the request and decode a successful reply
    fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (status, value) = self.exchange(request)?;
        if let Some(message) = error_message(&value) {
            return Err(ClientError::Application(message));
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(serde_json::from_value(value)?)
    }

    fn acknowledge(&self, request: RequestBuilder) -> Result<()> {
        self.call::<Value>(request).map(|_| ())
    }
}

impl GameServer for HttpGameServer {
    fn create_game(&self) -> Result<CreatedGame> {
        self.call(self.post("/create_game"))
    }

    fn list_games(&self) -> Result<Vec<GameListing>> {
        let list: GameList = self.call(self.get("/list_games"))?;
        Ok(list.games)
    }

    fn get_game(&self, game_id: &str) -> Result<Value> {
        let (status, value) = self.exchange(self.get(&format!("/get_game/{}", game_id)))?;
        if !status.is_success() && error_message(&value).is_none() {
            return Err(ClientError::Status(status));
        }
        Ok(value)
    }

    fn add_player(&self, game_id: &str, player_name: &str, team: Option<&str>) -> Result<JoinGrant> {
        let body = NewPlayer {
            game_id,
            player_name,
            team,
        };
        self.call(self.post("/add_player").json(&body))
    }

    fn start_game(&self, game_id: &str) -> Result<()> {
        self.acknowledge(self.post("/start_game").json(&GameRef { game_id }))
    }

    fn start_turn(&self, token: &str) -> Result<TurnCard> {
        self.call(self.post_as("/start_turn", token))
    }

    fn ready_turn(&self, token: &str) -> Result<TurnCard> {
        self.call(self.post_as("/ready_turn", token))
    }

    fn assign_points(&self, token: &str, points: i32, team: &str) -> Result<ScoreUpdate> {
        let body = PointsAward { points, team };
        self.call(self.post_as("/assign_points", token).json(&body))
    }

    fn end_turn(&self, token: &str) -> Result<TurnHandoff> {
        self.call(self.post_as("/end_turn", token))
    }

    fn submit_phrase(&self, token: &str, target_player_id: &str, phrase: &str) -> Result<()> {
        let body = PhraseEntry {
            target_player_id,
            phrase,
        };
        self.acknowledge(self.post_as("/submit_phrase", token).json(&body))
    }

    fn start_next_round(&self, token: &str) -> Result<()> {
        self.acknowledge(self.post_as("/start_next_round", token))
    }

    fn submissions_for_player(&self, token: &str) -> Result<Vec<PhraseChoice>> {
        let list: SubmissionList = self.call(
            self.get("/get_submissions_for_player")
                .header(SESSION_HEADER, token),
        )?;
        Ok(list.submissions)
    }

    fn vote_for_phrase(&self, token: &str, submission_id: &str) -> Result<()> {
        self.acknowledge(self.post_as("/vote_for_phrase", token).json(&Ballot { submission_id }))
    }
}
