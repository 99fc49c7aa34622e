//! Background request worker
//!
//! Requests are queued to a single thread that owns the `GameServer`; each
//! result comes back tagged with the ticket it was issued under so the
//! coordinator can drop answers nobody is waiting for any more.

use super::protocol::{CreatedGame, GameListing, JoinGrant, ScoreUpdate, TurnCard, TurnHandoff};
use super::schedule::Lease;
use super::{ClientError, GameServer};
use crate::game::venns::PhraseChoice;
use crate::game::Control;
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use tracing::{debug, warn};

/// A call to make against the game server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListGames,
    CreateGame,
    GetGame {
        game_id: String,
    },
    AddPlayer {
        game_id: String,
        player_name: String,
        team: Option<String>,
    },
    StartGame {
        game_id: String,
    },
    StartTurn {
        token: String,
    },
    ReadyTurn {
        token: String,
    },
    AssignPoints {
        token: String,
        points: i32,
        team: String,
    },
    EndTurn {
        token: String,
    },
    SubmitPhrase {
        token: String,
        target_player_id: String,
        phrase: String,
    },
    StartNextRound {
        token: String,
    },
    Submissions {
        token: String,
    },
    Vote {
        token: String,
        submission_id: String,
    },
}

impl Request {
    /// Endpoint name, for logs
    pub fn endpoint(&self) -> &'static str {
        match self {
            Request::ListGames => "list_games",
            Request::CreateGame => "create_game",
            Request::GetGame { .. } => "get_game",
            Request::AddPlayer { .. } => "add_player",
            Request::StartGame { .. } => "start_game",
            Request::StartTurn { .. } => "start_turn",
            Request::ReadyTurn { .. } => "ready_turn",
            Request::AssignPoints { .. } => "assign_points",
            Request::EndTurn { .. } => "end_turn",
            Request::SubmitPhrase { .. } => "submit_phrase",
            Request::StartNextRound { .. } => "start_next_round",
            Request::Submissions { .. } => "get_submissions_for_player",
            Request::Vote { .. } => "vote_for_phrase",
        }
    }
}

/// What the server answered
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Games(Vec<GameListing>),
    Created(CreatedGame),
    Snapshot(Value),
    Joined(JoinGrant),
    Card(TurnCard),
    Scored(ScoreUpdate),
    Handoff(TurnHandoff),
    Phrases(Vec<PhraseChoice>),
    Done,
}

/// Why a request was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Lobby game list refresh
    Browse,
    /// Snapshot of the game selected in the lobby
    Inspect,
    Create,
    Join,
    /// Validate a remembered identity at startup
    Reconnect,
    /// Periodic snapshot of the game being played
    Poll,
    /// Phrases the local player may vote on
    Phrases,
    /// A player-initiated game action
    Action(Control),
}

/// Context a request was issued in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub purpose: Purpose,
    /// Game the request concerns, if any
    pub game_id: Option<String>,
    /// Poll lease, for scheduled requests
    pub lease: Option<Lease>,
}

impl Ticket {
    pub fn new(purpose: Purpose, game_id: Option<&str>) -> Self {
        Self {
            purpose,
            game_id: game_id.map(str::to_string),
            lease: None,
        }
    }

    pub fn leased(mut self, lease: Lease) -> Self {
        self.lease = Some(lease);
        self
    }
}

/// A request waiting to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub ticket: Ticket,
    pub request: Request,
}

/// A finished request
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<Reply, ClientError>,
}

/// Perform one request
pub fn execute(server: &dyn GameServer, request: &Request) -> Result<Reply, ClientError> {
    let reply = match request {
        Request::ListGames => Reply::Games(server.list_games()?),
        Request::CreateGame => Reply::Created(server.create_game()?),
        Request::GetGame { game_id } => Reply::Snapshot(server.get_game(game_id)?),
        Request::AddPlayer {
            game_id,
            player_name,
            team,
        } => Reply::Joined(server.add_player(game_id, player_name, team.as_deref())?),
        Request::StartGame { game_id } => {
            server.start_game(game_id)?;
            Reply::Done
        }
        Request::StartTurn { token } => Reply::Card(server.start_turn(token)?),
        Request::ReadyTurn { token } => Reply::Card(server.ready_turn(token)?),
        Request::AssignPoints {
            token,
            points,
            team,
        } => Reply::Scored(server.assign_points(token, *points, team)?),
        Request::EndTurn { token } => Reply::Handoff(server.end_turn(token)?),
        Request::SubmitPhrase {
            token,
            target_player_id,
            phrase,
        } => {
            server.submit_phrase(token, target_player_id, phrase)?;
            Reply::Done
        }
        Request::StartNextRound { token } => {
            server.start_next_round(token)?;
            Reply::Done
        }
        Request::Submissions { token } => Reply::Phrases(server.submissions_for_player(token)?),
        Request::Vote {
            token,
            submission_id,
        } => {
            server.vote_for_phrase(token, submission_id)?;
            Reply::Done
        }
    };
    Ok(reply)
}

/// Runs requests on a background thread
pub struct Worker {
    jobs: Sender<Job>,
    completions: Receiver<Completion>,
    alive: bool,
}

impl Worker {
    /// Start the worker thread; it exits once the `Worker` is dropped
    pub fn spawn<S: GameServer + 'static>(server: S) -> Self {
        let (jobs_tx, jobs_rx) = channel::<Job>();
        let (done_tx, done_rx) = channel::<Completion>();

        thread::spawn(move || {
            while let Ok(job) = jobs_rx.recv() {
                let endpoint = job.request.endpoint();
                let result = execute(&server, &job.request);
                match &result {
                    Ok(_) => debug!("{} ok", endpoint),
                    Err(e) => debug!("{} failed: {}", endpoint, e),
                }
                if done_tx
                    .send(Completion {
                        ticket: job.ticket,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            jobs: jobs_tx,
            completions: done_rx,
            alive: true,
        }
    }

    /// Queue a request
    pub fn submit(&mut self, job: Job) {
        if self.jobs.send(job).is_err() {
            warn!("request worker has stopped");
            self.alive = false;
        }
    }

    /// Collect every finished request (non-blocking)
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        loop {
            match self.completions.try_recv() {
                Ok(completion) => done.push(completion),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.alive = false;
                    break;
                }
            }
        }
        done
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
