//! Application screen state management
//!
//! Handles transitions between the application screens:
//! - Lobby (game list, name entry, team choice)
//! - Reconnecting to a remembered game
//! - In game
//!
//! The coordinator never performs I/O itself. It queues `Job`s, which the
//! main loop hands to the request worker, and applies the `Completion`s
//! that come back. Every method that depends on time takes the current
//! clock reading explicitly.

use super::state::{GameSession, GameView};
use crate::config::Variant;
use crate::game::phrase::{self, opponent_of, PhraseSnapshot, TEAM_A, TEAM_B};
use crate::game::venns::{self, ScoreLedger, VennsSnapshot};
use crate::game::{Control, LocalIdentity, Millis, Observed, StartPolicy};
use crate::network::{
    ClientError, Completion, GameListing, Job, PollSchedule, Purpose, Reply, Request, Ticket,
};
use crate::storage::Storage;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest player name accepted in the lobby
pub const MAX_NAME_LEN: usize = 20;

/// Behaviour knobs fixed at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub variant: Variant,
    pub start_policy: StartPolicy,
    pub game_poll: Duration,
    pub lobby_poll: Duration,
}

/// Which lobby widget receives typed characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyFocus {
    Games,
    Name,
}

/// A join request waiting for the server
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingJoin {
    player_name: String,
    team: Option<String>,
}

/// Lobby screen state
#[derive(Debug, Clone)]
pub struct LobbyState {
    pub games: Vec<GameListing>,
    pub selected: usize,
    pub name_input: String,
    /// Team letter to join (phrase game)
    pub team: &'static str,
    pub focus: LobbyFocus,
    /// Last snapshot of the highlighted game, keyed by its id
    pub inspected: Option<(String, Value)>,
    /// Game to highlight once it shows up in the list
    pending_select: Option<String>,
    joining: Option<PendingJoin>,
}

impl LobbyState {
    fn new(player_name: String) -> Self {
        Self {
            games: Vec::new(),
            selected: 0,
            focus: if player_name.is_empty() {
                LobbyFocus::Name
            } else {
                LobbyFocus::Games
            },
            name_input: player_name,
            team: TEAM_A,
            inspected: None,
            pending_select: None,
            joining: None,
        }
    }

    pub fn selected_game(&self) -> Option<&GameListing> {
        self.games.get(self.selected)
    }

    pub fn is_joining(&self) -> bool {
        self.joining.is_some()
    }

    /// Replace the game list, keeping the highlight on the same game
    fn set_games(&mut self, games: Vec<GameListing>) {
        let previous = self.selected_game().map(|g| g.game_id.clone());
        self.games = games;

        let wanted = self.pending_select.clone().or(previous);
        if let Some(index) = wanted
            .as_deref()
            .and_then(|id| self.games.iter().position(|g| g.game_id == id))
        {
            self.selected = index;
            if self.pending_select.as_deref() == Some(self.games[index].game_id.as_str()) {
                self.pending_select = None;
            }
        } else {
            self.selected = self.selected.min(self.games.len().saturating_sub(1));
        }

        let current = self.selected_game().map(|g| g.game_id.as_str());
        if self.inspected.as_ref().map(|(id, _)| id.as_str()) != current {
            self.inspected = None;
        }
    }
}

/// The current application screen
pub enum Screen {
    Lobby(LobbyState),
    /// Checking that a remembered identity still belongs to a live game
    Reconnecting { identity: LocalIdentity },
    InGame(GameSession),
}

/// A transient message for the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Main application coordinator
pub struct AppCoordinator {
    /// Current screen
    pub screen: Screen,
    /// Message shown until replaced or dismissed
    pub notice: Option<Notice>,
    /// Whether the application should quit
    pub should_quit: bool,
    settings: Settings,
    storage: Storage,
    game_poll: PollSchedule,
    lobby_poll: PollSchedule,
    outbox: Vec<Job>,
}

impl AppCoordinator {
    /// Start in the lobby, or resume the remembered game for this variant
    pub fn new(settings: Settings, storage: Storage, now: Millis) -> Self {
        let handle = match storage.handle() {
            Ok(Some(handle)) => handle,
            Ok(None) => default_handle(),
            Err(e) => {
                warn!("could not read stored player name: {}", e);
                default_handle()
            }
        };
        let remembered = storage.load_identity(settings.variant).unwrap_or_else(|e| {
            warn!("could not read stored session: {}", e);
            None
        });

        let mut coordinator = Self {
            screen: Screen::Lobby(LobbyState::new(handle)),
            notice: None,
            should_quit: false,
            game_poll: PollSchedule::after_completion(settings.game_poll),
            lobby_poll: PollSchedule::fixed(settings.lobby_poll),
            settings,
            storage,
            outbox: Vec::new(),
        };

        match remembered {
            Some(identity) => {
                info!("resuming game {} as {}", identity.game_id, identity.player_name);
                coordinator.outbox.push(Job {
                    ticket: Ticket::new(Purpose::Reconnect, Some(&identity.game_id)),
                    request: Request::GetGame {
                        game_id: identity.game_id.clone(),
                    },
                });
                coordinator.screen = Screen::Reconnecting { identity };
            }
            None => coordinator.lobby_poll.start(now),
        }

        coordinator
    }

    pub fn variant(&self) -> Variant {
        self.settings.variant
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Requests queued since the last call
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.outbox)
    }

    /// Issue any polls that have come due
    pub fn tick(&mut self, now: Millis) {
        if let Some(lease) = self.lobby_poll.poll_due(now) {
            if matches!(self.screen, Screen::Lobby(_)) {
                self.outbox.push(Job {
                    ticket: Ticket::new(Purpose::Browse, None).leased(lease),
                    request: Request::ListGames,
                });
            } else {
                self.lobby_poll.stop();
            }
        }

        if let Some(lease) = self.game_poll.poll_due(now) {
            if let Screen::InGame(session) = &self.screen {
                let game_id = session.identity.game_id.clone();
                self.outbox.push(Job {
                    ticket: Ticket::new(Purpose::Poll, Some(&game_id)).leased(lease),
                    request: Request::GetGame { game_id },
                });
            } else {
                self.game_poll.stop();
            }
        }
    }

    /// The game screen's view at `now`, when in a game
    pub fn game_view(&self, now: Millis) -> Option<GameView> {
        match &self.screen {
            Screen::InGame(session) => Some(session.view(now, self.settings.start_policy)),
            _ => None,
        }
    }

    /// The highlighted lobby game as seen by someone who has not joined it
    pub fn lobby_preview(&self, now: Millis) -> Option<GameView> {
        let Screen::Lobby(lobby) = &self.screen else {
            return None;
        };
        let (_, value) = lobby.inspected.as_ref()?;
        let policy = self.settings.start_policy;
        Some(match self.settings.variant {
            Variant::Phrase => {
                GameView::Phrase(phrase::derive(&Observed::from_json(value), None, now, policy))
            }
            Variant::Venns => GameView::Venns(venns::derive(
                &Observed::from_json(value),
                None,
                &ScoreLedger::default(),
                &[],
                policy,
            )),
        })
    }

    // Completions

    /// Apply a finished request
    pub fn on_completion(&mut self, completion: Completion, now: Millis) {
        let Completion { ticket, result } = completion;
        match ticket.purpose {
            Purpose::Browse => self.on_games(ticket, result, now),
            Purpose::Inspect => self.on_inspect(ticket, result),
            Purpose::Create => self.on_created(result, now),
            Purpose::Join => self.on_joined(ticket, result, now),
            Purpose::Reconnect => self.on_reconnect(ticket, result, now),
            Purpose::Poll => self.on_poll(ticket, result, now),
            Purpose::Phrases => self.on_phrases(ticket, result),
            Purpose::Action(control) => self.on_action(control, ticket, result, now),
        }
    }

    fn on_games(&mut self, ticket: Ticket, result: Result<Reply, ClientError>, now: Millis) {
        if let Some(lease) = ticket.lease {
            self.lobby_poll.complete(lease, now);
        }
        let Screen::Lobby(lobby) = &mut self.screen else {
            debug!("dropping game list: lobby closed");
            return;
        };
        match result {
            Ok(Reply::Games(games)) => {
                lobby.set_games(games);
                self.inspect_selected();
            }
            Ok(other) => warn!("unexpected reply to list_games: {:?}", other),
            Err(e) => warn!("list_games failed: {}", e),
        }
    }

    fn on_inspect(&mut self, ticket: Ticket, result: Result<Reply, ClientError>) {
        let Screen::Lobby(lobby) = &mut self.screen else {
            return;
        };
        let Some(game_id) = ticket.game_id else {
            return;
        };
        if lobby.selected_game().map(|g| g.game_id.as_str()) != Some(game_id.as_str()) {
            debug!("dropping snapshot of {}: no longer highlighted", game_id);
            return;
        }
        match result {
            Ok(Reply::Snapshot(value)) => lobby.inspected = Some((game_id, value)),
            Ok(other) => warn!("unexpected reply to get_game: {:?}", other),
            Err(e) => {
                warn!("get_game {} failed: {}", game_id, e);
                lobby.inspected = None;
            }
        }
    }

    fn on_created(&mut self, result: Result<Reply, ClientError>, now: Millis) {
        let Screen::Lobby(lobby) = &mut self.screen else {
            return;
        };
        match result {
            Ok(Reply::Created(created)) => {
                info!("created game {}", created.game_id);
                match self.settings.variant {
                    Variant::Phrase => {
                        lobby.pending_select = Some(created.game_id.clone());
                        self.notice = Some(Notice::info(format!(
                            "Game {} created. Press Enter to join.",
                            created.game_id
                        )));
                        self.lobby_poll.expedite(now);
                    }
                    // The Venns creator joins straight away
                    Variant::Venns => self.join(created.game_id),
                }
            }
            Ok(other) => warn!("unexpected reply to create_game: {:?}", other),
            Err(e) => self.notice = Some(Notice::error(format!("Could not create game: {}", e))),
        }
    }

    fn on_joined(&mut self, ticket: Ticket, result: Result<Reply, ClientError>, now: Millis) {
        let Screen::Lobby(lobby) = &mut self.screen else {
            return;
        };
        let (Some(pending), Some(game_id)) = (lobby.joining.take(), ticket.game_id) else {
            return;
        };

        match result {
            Ok(Reply::Joined(grant)) => {
                let identity = LocalIdentity {
                    player_id: grant.player_id,
                    session_token: grant.session_token,
                    game_id,
                    player_name: pending.player_name,
                    team: pending.team,
                };
                info!("joined game {} as {}", identity.game_id, identity.player_id);
                if let Err(e) = self.storage.save_identity(self.settings.variant, &identity) {
                    warn!("could not remember session: {}", e);
                }
                self.notice = Some(Notice::info(format!("Joined as {}", identity.player_name)));
                self.enter_game(identity, ScoreLedger::default(), now);
            }
            Ok(other) => warn!("unexpected reply to add_player: {:?}", other),
            Err(e) => self.notice = Some(Notice::error(format!("Could not join: {}", e))),
        }
    }

    fn on_reconnect(&mut self, ticket: Ticket, result: Result<Reply, ClientError>, now: Millis) {
        let Screen::Reconnecting { identity } = &self.screen else {
            return;
        };
        if ticket.game_id.as_deref() != Some(identity.game_id.as_str()) {
            return;
        }
        let identity = identity.clone();

        let failure = match &result {
            Ok(Reply::Snapshot(value)) => self.snapshot_problem(value),
            Ok(other) => Some(format!("unexpected reply {:?}", other)),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = failure {
            warn!("could not resume game {}: {}", identity.game_id, reason);
            self.abandon_session(&identity.player_name, now);
            self.notice = Some(Notice::error(format!("Could not resume your game: {}", reason)));
            return;
        }

        let ledger = self
            .storage
            .load_ledger(self.settings.variant, &identity.game_id)
            .unwrap_or_else(|e| {
                warn!("could not read score ledger: {}", e);
                ScoreLedger::default()
            });
        self.enter_game(identity, ledger, now);
        if let Ok(Reply::Snapshot(value)) = result {
            self.apply_snapshot(&value);
        }
    }

    fn on_poll(&mut self, ticket: Ticket, result: Result<Reply, ClientError>, now: Millis) {
        if let Some(lease) = ticket.lease {
            self.game_poll.complete(lease, now);
        }
        if !self.is_current_game(ticket.game_id.as_deref()) {
            debug!("dropping snapshot for {:?}: not the current game", ticket.game_id);
            return;
        }
        match result {
            Ok(Reply::Snapshot(value)) => self.apply_snapshot(&value),
            Ok(other) => warn!("unexpected reply to get_game: {:?}", other),
            // Next scheduled poll retries
            Err(e) if e.is_transport() => warn!("poll failed: {}", e),
            Err(e) => error!("poll rejected: {}", e),
        }
    }

    fn on_phrases(&mut self, ticket: Ticket, result: Result<Reply, ClientError>) {
        if !self.is_current_game(ticket.game_id.as_deref()) {
            return;
        }
        let Screen::InGame(session) = &mut self.screen else {
            return;
        };
        session.phrases_pending = false;
        match result {
            Ok(Reply::Phrases(phrases)) => session.set_phrases(phrases),
            Ok(other) => warn!("unexpected reply to get_submissions_for_player: {:?}", other),
            // Refetched on the next voting snapshot
            Err(e) => warn!("could not fetch phrases to vote on: {}", e),
        }
    }

    fn on_action(
        &mut self,
        control: Control,
        ticket: Ticket,
        result: Result<Reply, ClientError>,
        now: Millis,
    ) {
        if !self.is_current_game(ticket.game_id.as_deref()) {
            // Starting a game straight from the lobby
            if control == Control::StartGame && matches!(self.screen, Screen::Lobby(_)) {
                match result {
                    Ok(_) => {
                        self.notice = Some(Notice::info("Game started"));
                        self.inspect_selected();
                    }
                    Err(e) => self.notice = Some(Notice::error(e.to_string())),
                }
            } else {
                debug!("dropping {:?} result: game left", control);
            }
            return;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{:?} failed: {}", control, e);
                self.notice = Some(Notice::error(e.to_string()));
                return;
            }
        };

        match (control, reply) {
            (_, Reply::Handoff(handoff)) => {
                self.notice = Some(Notice::info(format!("Turn ended. Next: {}", handoff.next_label())));
            }
            (_, Reply::Scored(update)) if update.expired => {
                self.notice = Some(Notice::info("Time's up"));
            }
            (Control::StartGame, _) => self.notice = Some(Notice::info("Game started")),
            (Control::SubmitPhrase, _) => {
                if let Screen::InGame(session) = &mut self.screen {
                    session.draft.clear();
                }
                self.notice = Some(Notice::info("Phrase submitted"));
            }
            (Control::Vote, _) => {
                self.notice = Some(Notice::info("Vote recorded"));
                self.request_phrases();
            }
            _ => {}
        }

        self.game_poll.expedite(now);
    }

    fn apply_snapshot(&mut self, value: &Value) {
        let variant = self.settings.variant;
        let Screen::InGame(session) = &mut self.screen else {
            return;
        };

        let change = session.apply_snapshot(variant, value);
        if change.ledger_changed {
            if let Err(e) = self
                .storage
                .save_ledger(variant, &session.identity.game_id, &session.ledger)
            {
                warn!("could not save score ledger: {}", e);
            }
        }
        if session.needs_phrases() {
            self.request_phrases();
        }
    }

    /// Fetch the phrases written about our own pair
    fn request_phrases(&mut self) {
        let Screen::InGame(session) = &mut self.screen else {
            return;
        };
        if session.phrases_pending {
            return;
        }
        session.phrases_pending = true;
        self.outbox.push(Job {
            ticket: Ticket::new(Purpose::Phrases, Some(&session.identity.game_id)),
            request: Request::Submissions {
                token: session.identity.session_token.clone(),
            },
        });
    }

    /// Why a reconnect snapshot cannot be trusted, if it cannot
    fn snapshot_problem(&self, value: &Value) -> Option<String> {
        match self.settings.variant {
            Variant::Phrase => Observed::<PhraseSnapshot>::from_json(value)
                .problem()
                .map(str::to_string),
            Variant::Venns => Observed::<VennsSnapshot>::from_json(value)
                .problem()
                .map(str::to_string),
        }
    }

    fn is_current_game(&self, game_id: Option<&str>) -> bool {
        match (&self.screen, game_id) {
            (Screen::InGame(session), Some(id)) => session.identity.is_for(id),
            _ => false,
        }
    }

    fn enter_game(&mut self, identity: LocalIdentity, ledger: ScoreLedger, now: Millis) {
        self.lobby_poll.stop();
        self.screen = Screen::InGame(GameSession::new(identity, ledger));
        self.game_poll.start(now);
    }

    /// Forget the current identity and go back to the lobby
    fn abandon_session(&mut self, player_name: &str, now: Millis) {
        if let Err(e) = self.storage.clear_session(self.settings.variant) {
            warn!("could not clear stored session: {}", e);
        }
        self.game_poll.stop();
        self.screen = Screen::Lobby(LobbyState::new(player_name.to_string()));
        self.lobby_poll.start(now);
    }

    // Lobby input

    pub fn lobby_up(&mut self) {
        if let Screen::Lobby(lobby) = &mut self.screen {
            if lobby.selected > 0 {
                lobby.selected -= 1;
                lobby.inspected = None;
                self.inspect_selected();
            }
        }
    }

    pub fn lobby_down(&mut self) {
        if let Screen::Lobby(lobby) = &mut self.screen {
            if lobby.selected + 1 < lobby.games.len() {
                lobby.selected += 1;
                lobby.inspected = None;
                self.inspect_selected();
            }
        }
    }

    /// Switch between the game list and the name field
    pub fn lobby_tab(&mut self) {
        if let Screen::Lobby(lobby) = &mut self.screen {
            lobby.focus = match lobby.focus {
                LobbyFocus::Games => LobbyFocus::Name,
                LobbyFocus::Name => LobbyFocus::Games,
            };
        }
    }

    pub fn lobby_focus(&self) -> Option<LobbyFocus> {
        match &self.screen {
            Screen::Lobby(lobby) => Some(lobby.focus),
            _ => None,
        }
    }

    pub fn lobby_char(&mut self, c: char) {
        if let Screen::Lobby(lobby) = &mut self.screen {
            if lobby.focus == LobbyFocus::Name && lobby.name_input.chars().count() < MAX_NAME_LEN {
                lobby.name_input.push(c);
            }
        }
    }

    pub fn lobby_backspace(&mut self) {
        if let Screen::Lobby(lobby) = &mut self.screen {
            if lobby.focus == LobbyFocus::Name {
                lobby.name_input.pop();
            }
        }
    }

    /// Flip the team to join (phrase game)
    pub fn lobby_toggle_team(&mut self) {
        if !self.settings.variant.has_teams() {
            return;
        }
        if let Screen::Lobby(lobby) = &mut self.screen {
            lobby.team = if lobby.team == TEAM_A { TEAM_B } else { TEAM_A };
        }
    }

    /// Refresh the game list now
    pub fn refresh_games(&mut self, now: Millis) {
        if matches!(self.screen, Screen::Lobby(_)) {
            self.lobby_poll.expedite(now);
        }
    }

    pub fn create_game(&mut self) {
        let Screen::Lobby(lobby) = &self.screen else {
            return;
        };
        if self.settings.variant == Variant::Venns && lobby.name_input.trim().is_empty() {
            self.notice = Some(Notice::error("Enter your name first"));
            return;
        }
        self.outbox.push(Job {
            ticket: Ticket::new(Purpose::Create, None),
            request: Request::CreateGame,
        });
    }

    /// Join the highlighted game
    pub fn join_game(&mut self) {
        let Screen::Lobby(lobby) = &self.screen else {
            return;
        };
        match lobby.selected_game() {
            Some(game) => {
                let game_id = game.game_id.clone();
                self.join(game_id);
            }
            None => self.notice = Some(Notice::error("No game selected")),
        }
    }

    fn join(&mut self, game_id: String) {
        let variant = self.settings.variant;
        let Screen::Lobby(lobby) = &mut self.screen else {
            return;
        };
        if lobby.joining.is_some() {
            return;
        }
        let player_name = lobby.name_input.trim().to_string();
        if player_name.is_empty() {
            lobby.focus = LobbyFocus::Name;
            self.notice = Some(Notice::error("Enter your name first"));
            return;
        }

        let team = variant.has_teams().then(|| lobby.team.to_string());
        lobby.joining = Some(PendingJoin {
            player_name: player_name.clone(),
            team: team.clone(),
        });
        if let Err(e) = self.storage.set_handle(&player_name) {
            warn!("could not remember player name: {}", e);
        }
        self.outbox.push(Job {
            ticket: Ticket::new(Purpose::Join, Some(&game_id)),
            request: Request::AddPlayer {
                game_id,
                player_name,
                team,
            },
        });
    }

    fn inspect_selected(&mut self) {
        let Screen::Lobby(lobby) = &self.screen else {
            return;
        };
        if let Some(game) = lobby.selected_game() {
            let game_id = game.game_id.clone();
            self.outbox.push(Job {
                ticket: Ticket::new(Purpose::Inspect, Some(&game_id)),
                request: Request::GetGame { game_id },
            });
        }
    }

    // Game actions

    /// Start the game, from the lobby or the waiting screen
    pub fn start_game(&mut self, now: Millis) {
        let game_id = match &self.screen {
            Screen::Lobby(lobby) => {
                let allowed = self
                    .lobby_preview(now)
                    .is_some_and(|view| view.allows(Control::StartGame));
                match lobby.selected_game() {
                    Some(game) if allowed => game.game_id.clone(),
                    _ => return,
                }
            }
            Screen::InGame(session) if self.allows(Control::StartGame, now) => {
                session.identity.game_id.clone()
            }
            _ => return,
        };
        self.outbox.push(Job {
            ticket: Ticket::new(Purpose::Action(Control::StartGame), Some(&game_id)),
            request: Request::StartGame { game_id },
        });
    }

    /// Signal readiness; the server starts the clock and deals the card
    pub fn ready_turn(&mut self, now: Millis) {
        self.act(Control::Ready, now, |session| Request::ReadyTurn {
            token: session.identity.session_token.clone(),
        });
    }

    /// Take the turn without the ready handshake
    pub fn start_turn(&mut self, now: Millis) {
        self.act(Control::Ready, now, |session| Request::StartTurn {
            token: session.identity.session_token.clone(),
        });
    }

    pub fn end_turn(&mut self, now: Millis) {
        self.act(Control::EndTurn, now, |session| Request::EndTurn {
            token: session.identity.session_token.clone(),
        });
    }

    /// Award points while the other team plays.
    ///
    /// `AssignSelf1`/`AssignSelf3` credit the team whose turn it is;
    /// `AssignOpponent1` credits the other team.
    pub fn assign_points(&mut self, control: Control, now: Millis) {
        let Some(GameView::Phrase(view)) = self.game_view(now) else {
            return;
        };
        let (points, team) = match control {
            Control::AssignSelf1 => (1, view.current_team.clone()),
            Control::AssignSelf3 => (3, view.current_team.clone()),
            Control::AssignOpponent1 => (1, opponent_of(&view.current_team).to_string()),
            _ => return,
        };
        self.act(control, now, |session| Request::AssignPoints {
            token: session.identity.session_token.clone(),
            points,
            team,
        });
    }

    /// Submit the typed phrase about the highlighted player's word pair
    pub fn submit_phrase(&mut self, now: Millis) {
        let Some(GameView::Venns(view)) = self.game_view(now) else {
            return;
        };
        let Screen::InGame(session) = &self.screen else {
            return;
        };
        let Some(target) = view.other_word_pairs.get(session.cursor) else {
            return;
        };
        let phrase = session.draft.trim().to_string();
        if phrase.is_empty() {
            self.notice = Some(Notice::error("Type a phrase first"));
            return;
        }
        let target_player_id = target.player_id.clone();
        self.act(Control::SubmitPhrase, now, |session| Request::SubmitPhrase {
            token: session.identity.session_token.clone(),
            target_player_id,
            phrase,
        });
    }

    /// Vote for the highlighted phrase about our own pair
    pub fn vote(&mut self, now: Millis) {
        let Some(GameView::Venns(view)) = self.game_view(now) else {
            return;
        };
        let Screen::InGame(session) = &self.screen else {
            return;
        };
        let Some(choice) = view.phrases_for_my_pair.get(session.cursor) else {
            return;
        };
        let submission_id = choice.id.clone();
        self.act(Control::Vote, now, |session| Request::Vote {
            token: session.identity.session_token.clone(),
            submission_id,
        });
    }

    pub fn start_next_round(&mut self, now: Millis) {
        self.act(Control::StartNextRound, now, |session| Request::StartNextRound {
            token: session.identity.session_token.clone(),
        });
    }

    /// Enter in game: submit or vote, whichever the round calls for
    pub fn game_enter(&mut self, now: Millis) {
        if self.allows(Control::SubmitPhrase, now) {
            self.submit_phrase(now);
        } else if self.allows(Control::Vote, now) {
            self.vote(now);
        }
    }

    /// Leave the current game and forget the identity
    pub fn leave(&mut self, now: Millis) {
        let player_name = match &self.screen {
            Screen::InGame(session) => session.identity.player_name.clone(),
            Screen::Reconnecting { identity } => identity.player_name.clone(),
            Screen::Lobby(_) => return,
        };
        info!("leaving game");
        self.abandon_session(&player_name, now);
        self.notice = Some(Notice::info("Left the game"));
    }

    pub fn game_up(&mut self, now: Millis) {
        let len = self.list_len(now);
        if let Screen::InGame(session) = &mut self.screen {
            session.move_cursor(-1, len);
        }
    }

    pub fn game_down(&mut self, now: Millis) {
        let len = self.list_len(now);
        if let Screen::InGame(session) = &mut self.screen {
            session.move_cursor(1, len);
        }
    }

    pub fn game_char(&mut self, c: char) {
        if let Screen::InGame(session) = &mut self.screen {
            session.type_char(c);
        }
    }

    pub fn game_backspace(&mut self) {
        if let Screen::InGame(session) = &mut self.screen {
            session.backspace();
        }
    }

    /// Whether the in-game view currently offers `control`
    pub fn allows(&self, control: Control, now: Millis) -> bool {
        self.game_view(now).is_some_and(|view| view.allows(control))
    }

    /// Rows in the list the cursor moves through
    fn list_len(&self, now: Millis) -> usize {
        match self.game_view(now) {
            Some(GameView::Venns(view)) if view.allows(Control::SubmitPhrase) => view.other_word_pairs.len(),
            Some(GameView::Venns(view)) if view.allows(Control::Vote) => view.phrases_for_my_pair.len(),
            _ => 0,
        }
    }

    /// Queue an authenticated action if the current view offers `control`
    fn act(&mut self, control: Control, now: Millis, build: impl FnOnce(&GameSession) -> Request) {
        if !self.allows(control, now) {
            debug!("{:?} not available", control);
            return;
        }
        let Screen::InGame(session) = &self.screen else {
            return;
        };
        let job = Job {
            ticket: Ticket::new(Purpose::Action(control), Some(&session.identity.game_id)),
            request: build(session),
        };
        self.outbox.push(job);
    }
}

fn default_handle() -> String {
    std::env::var("USER")
        .unwrap_or_default()
        .chars()
        .take(MAX_NAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::phrase::PhraseScreen;
    use crate::game::venns::VennsScreen;
    use crate::network::JoinGrant;
    use serde_json::json;

    const T0: Millis = 1_792_152_000_000;

    fn settings(variant: Variant) -> Settings {
        Settings {
            variant,
            start_policy: StartPolicy::CreatorOnly,
            game_poll: Duration::from_millis(2000),
            lobby_poll: variant.default_lobby_poll(),
        }
    }

    fn fresh(variant: Variant) -> AppCoordinator {
        let storage = Storage::open_in_memory().unwrap();
        storage.set_handle("Ann").unwrap();
        AppCoordinator::new(settings(variant), storage, T0)
    }

    fn identity(variant: Variant) -> LocalIdentity {
        LocalIdentity {
            player_id: "p1".to_string(),
            session_token: "tok-1".to_string(),
            game_id: "g1".to_string(),
            player_name: "Ann".to_string(),
            team: variant.has_teams().then(|| "A".to_string()),
        }
    }

    fn resumed(variant: Variant) -> AppCoordinator {
        let storage = Storage::open_in_memory().unwrap();
        storage.save_identity(variant, &identity(variant)).unwrap();
        AppCoordinator::new(settings(variant), storage, T0)
    }

    fn reply(job: &Job, result: Result<Reply, ClientError>) -> Completion {
        Completion {
            ticket: job.ticket.clone(),
            result,
        }
    }

    /// Resume into an in-game screen showing `snapshot`
    fn in_game(variant: Variant, snapshot: Value) -> AppCoordinator {
        let mut app = resumed(variant);
        let jobs = app.take_jobs();
        app.on_completion(reply(&jobs[0], Ok(Reply::Snapshot(snapshot))), T0);
        assert!(matches!(app.screen, Screen::InGame(_)));
        app
    }

    fn phrase_turn(current_turn: &str, current_team: &str, ready: bool) -> Value {
        json!({
            "game_id": "g1",
            "state": "active",
            "teamA": ["p1", "p2"],
            "teamB": ["p3", "p4"],
            "scores": {"A": 2, "B": 1},
            "currentTurn": current_turn,
            "currentTeam": current_team,
            "turnReady": ready,
            "currentPhrase": "once in a blue moon",
            "currentWord": "moon",
            "turnEndTime": T0 + 20_000,
        })
    }

    fn venns_round(status: &str) -> Value {
        json!({
            "game_id": "g1",
            "state": "active",
            "players": ["p1", "p2", "p3"],
            "player_names": {"p1": "Ann", "p2": "Bo", "p3": "Cy"},
            "scores": {"p1": 0, "p2": 0, "p3": 0},
            "current_round": 1,
            "round_status": status,
            "word_pairs": {"p1": ["sun", "moon"], "p2": ["salt", "pepper"], "p3": ["cat", "dog"]},
        })
    }

    fn only_job(app: &mut AppCoordinator) -> Job {
        let mut jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1, "expected one job, got {:?}", jobs);
        jobs.remove(0)
    }

    #[test]
    fn test_starts_in_lobby_and_lists_games() {
        let mut app = fresh(Variant::Phrase);
        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.name_input == "Ann"));

        app.tick(T0);
        let job = only_job(&mut app);
        assert_eq!(job.request, Request::ListGames);
        assert_eq!(job.ticket.purpose, Purpose::Browse);

        // Fixed cadence, nothing until the interval passes
        app.on_completion(reply(&job, Ok(Reply::Games(vec![]))), T0 + 100);
        app.tick(T0 + 2999);
        assert!(app.take_jobs().is_empty());
        app.tick(T0 + 3000);
        assert_eq!(only_job(&mut app).request, Request::ListGames);
    }

    #[test]
    fn test_game_list_selects_and_inspects() {
        let mut app = fresh(Variant::Phrase);
        app.tick(T0);
        let job = only_job(&mut app);
        let games = vec![
            GameListing {
                game_id: "g1".into(),
                label: Some("Game g1".into()),
                player_count: None,
                players: None,
            },
            GameListing {
                game_id: "g2".into(),
                label: None,
                player_count: Some(2),
                players: None,
            },
        ];
        app.on_completion(reply(&job, Ok(Reply::Games(games))), T0);

        let inspect = only_job(&mut app);
        assert_eq!(inspect.ticket.purpose, Purpose::Inspect);
        assert_eq!(inspect.request, Request::GetGame { game_id: "g1".into() });

        app.lobby_down();
        let inspect = only_job(&mut app);
        assert_eq!(inspect.request, Request::GetGame { game_id: "g2".into() });

        // A late answer for the game we moved away from is ignored
        app.on_completion(
            Completion {
                ticket: Ticket::new(Purpose::Inspect, Some("g1")),
                result: Ok(Reply::Snapshot(json!({"state": "waiting"}))),
            },
            T0,
        );
        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.inspected.is_none()));
    }

    #[test]
    fn test_join_flow() {
        let mut app = fresh(Variant::Phrase);
        app.tick(T0);
        let list = only_job(&mut app);
        app.on_completion(
            reply(
                &list,
                Ok(Reply::Games(vec![GameListing {
                    game_id: "g1".into(),
                    label: None,
                    player_count: None,
                    players: None,
                }])),
            ),
            T0,
        );
        app.take_jobs();

        app.lobby_toggle_team();
        app.join_game();
        let join = only_job(&mut app);
        assert_eq!(
            join.request,
            Request::AddPlayer {
                game_id: "g1".into(),
                player_name: "Ann".into(),
                team: Some("B".into()),
            }
        );

        // A second press while the first is in flight does nothing
        app.join_game();
        assert!(app.take_jobs().is_empty());

        app.on_completion(
            reply(
                &join,
                Ok(Reply::Joined(JoinGrant {
                    player_id: "p9".into(),
                    session_token: "tok-9".into(),
                })),
            ),
            T0 + 50,
        );

        match &app.screen {
            Screen::InGame(session) => {
                assert_eq!(session.identity.player_id, "p9");
                assert_eq!(session.identity.team.as_deref(), Some("B"));
            }
            _ => panic!("expected in-game screen"),
        }
        let saved = app.storage.load_identity(Variant::Phrase).unwrap().unwrap();
        assert_eq!(saved.session_token, "tok-9");

        // Game poll starts immediately; lobby poll is stopped
        app.tick(T0 + 50);
        let poll = only_job(&mut app);
        assert_eq!(poll.ticket.purpose, Purpose::Poll);
        assert_eq!(poll.request, Request::GetGame { game_id: "g1".into() });
    }

    #[test]
    fn test_join_requires_name() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set_handle("").unwrap();
        let mut app = AppCoordinator::new(settings(Variant::Phrase), storage, T0);
        if let Screen::Lobby(lobby) = &mut app.screen {
            lobby.games = vec![GameListing {
                game_id: "g1".into(),
                label: None,
                player_count: None,
                players: None,
            }];
        }
        app.join_game();
        assert!(app.take_jobs().is_empty());
        assert!(app.notice.as_ref().is_some_and(|n| n.is_error));
    }

    #[test]
    fn test_join_rejected_stays_in_lobby() {
        let mut app = fresh(Variant::Phrase);
        if let Screen::Lobby(lobby) = &mut app.screen {
            lobby.games = vec![GameListing {
                game_id: "g1".into(),
                label: None,
                player_count: None,
                players: None,
            }];
        }
        app.join_game();
        let join = only_job(&mut app);
        app.on_completion(
            reply(&join, Err(ClientError::Application("Team is full".into()))),
            T0,
        );

        assert!(matches!(&app.screen, Screen::Lobby(lobby) if !lobby.is_joining()));
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("Could not join: Team is full"));
    }

    #[test]
    fn test_reconnect_into_waiting_game() {
        let mut app = resumed(Variant::Phrase);
        assert!(matches!(app.screen, Screen::Reconnecting { .. }));

        let job = only_job(&mut app);
        assert_eq!(job.ticket.purpose, Purpose::Reconnect);
        app.on_completion(
            reply(
                &job,
                Ok(Reply::Snapshot(json!({
                    "game_id": "g1",
                    "state": "waiting",
                    "teamA": ["p1"],
                    "teamB": [],
                }))),
            ),
            T0,
        );

        match app.game_view(T0) {
            Some(GameView::Phrase(view)) => assert_eq!(view.screen, PhraseScreen::WaitingForTurn),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_reconnect_failure_clears_session() {
        let mut app = resumed(Variant::Venns);
        let job = only_job(&mut app);
        app.on_completion(reply(&job, Ok(Reply::Snapshot(json!({"error": "Game not found"})))), T0);

        assert!(matches!(app.screen, Screen::Lobby(_)));
        assert!(app.notice.as_ref().is_some_and(|n| n.is_error && n.text.contains("Game not found")));
        assert_eq!(app.storage.load_identity(Variant::Venns).unwrap(), None);

        app.tick(T0);
        assert_eq!(only_job(&mut app).request, Request::ListGames);
    }

    #[test]
    fn test_reconnect_transport_failure_clears_session() {
        let mut app = resumed(Variant::Phrase);
        let job = only_job(&mut app);
        app.on_completion(reply(&job, Err(ClientError::Transport("refused".into()))), T0);

        assert!(matches!(app.screen, Screen::Lobby(_)));
        assert_eq!(app.storage.load_identity(Variant::Phrase).unwrap(), None);
    }

    #[test]
    fn test_poll_waits_for_completion() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", false));

        app.tick(T0);
        let poll = only_job(&mut app);

        // In flight: no second poll no matter how long it takes
        app.tick(T0 + 10_000);
        assert!(app.take_jobs().is_empty());

        app.on_completion(reply(&poll, Ok(Reply::Snapshot(phrase_turn("p3", "B", true)))), T0 + 10_500);
        app.tick(T0 + 12_499);
        assert!(app.take_jobs().is_empty());
        app.tick(T0 + 12_500);
        assert_eq!(only_job(&mut app).ticket.purpose, Purpose::Poll);
    }

    #[test]
    fn test_transport_error_keeps_polling() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", false));
        app.tick(T0);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Err(ClientError::Transport("timed out".into()))), T0 + 100);

        assert!(matches!(app.screen, Screen::InGame(_)));
        assert!(app.notice.is_none());
        app.tick(T0 + 2100);
        assert_eq!(only_job(&mut app).ticket.purpose, Purpose::Poll);
    }

    #[test]
    fn test_rejected_poll_keeps_polling() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", false));
        app.tick(T0);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Err(ClientError::Status(reqwest::StatusCode::BAD_GATEWAY))), T0 + 100);

        assert!(matches!(app.screen, Screen::InGame(_)));
        app.tick(T0 + 2100);
        assert_eq!(only_job(&mut app).ticket.purpose, Purpose::Poll);
    }

    #[test]
    fn test_snapshot_for_other_game_dropped() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", false));
        app.on_completion(
            Completion {
                ticket: Ticket::new(Purpose::Poll, Some("other")),
                result: Ok(Reply::Snapshot(phrase_turn("p1", "A", false))),
            },
            T0,
        );
        match app.game_view(T0) {
            Some(GameView::Phrase(view)) => assert_eq!(view.current_team, "B"),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn test_ready_only_when_offered() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", false));
        app.ready_turn(T0);
        assert!(app.take_jobs().is_empty());

        let mut app = in_game(Variant::Phrase, phrase_turn("p1", "A", false));
        app.ready_turn(T0);
        let job = only_job(&mut app);
        assert_eq!(job.request, Request::ReadyTurn { token: "tok-1".into() });
        assert_eq!(job.ticket.purpose, Purpose::Action(Control::Ready));
    }

    #[test]
    fn test_assign_points_teams() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p3", "B", true));

        app.assign_points(Control::AssignSelf3, T0);
        assert_eq!(
            only_job(&mut app).request,
            Request::AssignPoints {
                token: "tok-1".into(),
                points: 3,
                team: "B".into(),
            }
        );

        app.assign_points(Control::AssignOpponent1, T0);
        assert_eq!(
            only_job(&mut app).request,
            Request::AssignPoints {
                token: "tok-1".into(),
                points: 1,
                team: "A".into(),
            }
        );
    }

    #[test]
    fn test_scoring_closed_to_playing_team() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p2", "A", true));
        app.assign_points(Control::AssignSelf1, T0);
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn test_end_turn_notice_and_expedited_poll() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p1", "A", true));
        app.tick(T0);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Ok(Reply::Snapshot(phrase_turn("p1", "A", true)))), T0 + 100);

        app.end_turn(T0 + 500);
        let end = only_job(&mut app);
        app.on_completion(
            reply(
                &end,
                Ok(Reply::Handoff(crate::network::TurnHandoff {
                    next_player: Some("p3".into()),
                    next_team: Some("B".into()),
                    next_player_name: Some("Cy".into()),
                })),
            ),
            T0 + 600,
        );

        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("Turn ended. Next: Cy"));
        app.tick(T0 + 600);
        assert_eq!(only_job(&mut app).ticket.purpose, Purpose::Poll);
    }

    #[test]
    fn test_application_error_is_notice() {
        let mut app = in_game(Variant::Phrase, phrase_turn("p1", "A", true));
        app.end_turn(T0);
        let end = only_job(&mut app);
        app.on_completion(reply(&end, Err(ClientError::Application("Not your turn".into()))), T0);

        assert!(matches!(app.screen, Screen::InGame(_)));
        assert_eq!(
            app.notice,
            Some(Notice {
                text: "Not your turn".into(),
                is_error: true,
            })
        );
        assert!(app.storage.load_identity(Variant::Phrase).unwrap().is_some());
    }

    #[test]
    fn test_countdown_moves_without_polling() {
        let app = in_game(Variant::Phrase, phrase_turn("p1", "A", true));
        let at = |now| match app.game_view(now) {
            Some(GameView::Phrase(view)) => view.countdown,
            other => panic!("unexpected view {:?}", other),
        };
        assert_eq!(at(T0), Some(20));
        assert_eq!(at(T0 + 10_250), Some(9));
        assert_eq!(at(T0 + 60_000), Some(0));
    }

    #[test]
    fn test_start_game_creator_only() {
        let waiting = json!({
            "game_id": "g1",
            "state": "waiting",
            "teamA": ["p1", "p2"],
            "teamB": ["p3", "p4"],
        });
        let mut app = in_game(Variant::Phrase, waiting);
        app.start_game(T0);
        assert_eq!(only_job(&mut app).request, Request::StartGame { game_id: "g1".into() });

        let not_creator = json!({
            "game_id": "g1",
            "state": "waiting",
            "teamA": ["p2", "p1"],
            "teamB": ["p3", "p4"],
        });
        let mut app = in_game(Variant::Phrase, not_creator);
        app.start_game(T0);
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn test_venns_voting_fetches_phrases() {
        let mut app = in_game(Variant::Venns, venns_round("submitting"));
        assert!(app.take_jobs().is_empty());

        app.tick(T0);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Ok(Reply::Snapshot(venns_round("voting")))), T0 + 100);

        let fetch = only_job(&mut app);
        assert_eq!(fetch.request, Request::Submissions { token: "tok-1".into() });
        app.on_completion(
            reply(
                &fetch,
                Ok(Reply::Phrases(vec![
                    venns::PhraseChoice {
                        id: "s1".into(),
                        phrase: "eclipse".into(),
                    },
                    venns::PhraseChoice {
                        id: "s2".into(),
                        phrase: "night and day".into(),
                    },
                ])),
            ),
            T0 + 150,
        );

        app.game_down(T0 + 200);
        app.game_enter(T0 + 200);
        assert_eq!(
            only_job(&mut app).request,
            Request::Vote {
                token: "tok-1".into(),
                submission_id: "s2".into(),
            }
        );
    }

    fn phrase_choices() -> Vec<venns::PhraseChoice> {
        vec![
            venns::PhraseChoice {
                id: "s1".into(),
                phrase: "eclipse".into(),
            },
            venns::PhraseChoice {
                id: "s2".into(),
                phrase: "night and day".into(),
            },
        ]
    }

    #[test]
    fn test_failed_phrase_fetch_retried_on_next_poll() {
        let mut app = in_game(Variant::Venns, venns_round("voting"));
        let fetch = only_job(&mut app);
        assert_eq!(fetch.ticket.purpose, Purpose::Phrases);
        app.on_completion(reply(&fetch, Err(ClientError::Transport("timed out".into()))), T0 + 50);
        assert!(app.notice.is_none());

        app.tick(T0 + 100);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Ok(Reply::Snapshot(venns_round("voting")))), T0 + 200);

        let retry = only_job(&mut app);
        assert_eq!(retry.request, Request::Submissions { token: "tok-1".into() });
        app.on_completion(reply(&retry, Ok(Reply::Phrases(phrase_choices()))), T0 + 250);
        match app.game_view(T0 + 300) {
            Some(GameView::Venns(view)) => assert_eq!(view.phrases_for_my_pair.len(), 2),
            other => panic!("unexpected view {:?}", other),
        }

        // Loaded: later voting snapshots do not fetch again
        app.tick(T0 + 2_200);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Ok(Reply::Snapshot(venns_round("voting")))), T0 + 2_300);
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn test_phrase_fetch_not_duplicated_while_pending() {
        let mut app = in_game(Variant::Venns, venns_round("voting"));
        let fetch = only_job(&mut app);

        app.tick(T0 + 100);
        let poll = only_job(&mut app);
        app.on_completion(reply(&poll, Ok(Reply::Snapshot(venns_round("voting")))), T0 + 200);
        assert!(app.take_jobs().is_empty());

        app.on_completion(reply(&fetch, Ok(Reply::Phrases(phrase_choices()))), T0 + 250);
        assert!(app.allows(Control::Vote, T0 + 300));
    }

    #[test]
    fn test_vote_refreshes_phrases() {
        let mut app = in_game(Variant::Venns, venns_round("voting"));
        let fetch = only_job(&mut app);
        app.on_completion(reply(&fetch, Ok(Reply::Phrases(phrase_choices()))), T0 + 50);

        app.game_enter(T0 + 100);
        let vote = only_job(&mut app);
        assert_eq!(
            vote.request,
            Request::Vote {
                token: "tok-1".into(),
                submission_id: "s1".into(),
            }
        );
        app.on_completion(reply(&vote, Ok(Reply::Done)), T0 + 150);

        let refresh = only_job(&mut app);
        assert_eq!(refresh.ticket.purpose, Purpose::Phrases);
        assert_eq!(refresh.request, Request::Submissions { token: "tok-1".into() });
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("Vote recorded"));
    }

    #[test]
    fn test_venns_submit_phrase() {
        let mut app = in_game(Variant::Venns, venns_round("submitting"));
        match app.game_view(T0) {
            Some(GameView::Venns(view)) => assert_eq!(view.screen, VennsScreen::Submitting),
            other => panic!("unexpected view {:?}", other),
        }

        // Empty draft is refused locally
        app.game_enter(T0);
        assert!(app.take_jobs().is_empty());

        for c in "table salt".chars() {
            app.game_char(c);
        }
        app.game_enter(T0);
        let submit = only_job(&mut app);
        assert_eq!(
            submit.request,
            Request::SubmitPhrase {
                token: "tok-1".into(),
                target_player_id: "p2".into(),
                phrase: "table salt".into(),
            }
        );

        app.on_completion(reply(&submit, Ok(Reply::Done)), T0 + 100);
        match &app.screen {
            Screen::InGame(session) => assert!(session.draft.is_empty()),
            _ => panic!("expected in-game screen"),
        }
    }

    #[test]
    fn test_venns_create_joins_immediately() {
        let mut app = fresh(Variant::Venns);
        app.take_jobs();
        app.create_game();
        let create = only_job(&mut app);
        app.on_completion(
            reply(
                &create,
                Ok(Reply::Created(crate::network::CreatedGame {
                    game_id: "g5".into(),
                })),
            ),
            T0,
        );
        assert_eq!(
            only_job(&mut app).request,
            Request::AddPlayer {
                game_id: "g5".into(),
                player_name: "Ann".into(),
                team: None,
            }
        );
    }

    #[test]
    fn test_phrase_create_selects_new_game() {
        let mut app = fresh(Variant::Phrase);
        app.tick(T0);
        let list = only_job(&mut app);
        app.on_completion(reply(&list, Ok(Reply::Games(vec![]))), T0);

        app.create_game();
        let create = only_job(&mut app);
        app.on_completion(
            reply(
                &create,
                Ok(Reply::Created(crate::network::CreatedGame {
                    game_id: "g2".into(),
                })),
            ),
            T0 + 10,
        );

        app.tick(T0 + 10);
        let refresh = only_job(&mut app);
        let listing = |id: &str| GameListing {
            game_id: id.into(),
            label: None,
            player_count: None,
            players: None,
        };
        app.on_completion(reply(&refresh, Ok(Reply::Games(vec![listing("g1"), listing("g2")]))), T0 + 20);
        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.selected == 1));
    }

    #[test]
    fn test_leave_returns_to_lobby() {
        let mut app = in_game(Variant::Venns, venns_round("submitting"));
        app.leave(T0);

        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.name_input == "Ann"));
        assert_eq!(app.storage.load_identity(Variant::Venns).unwrap(), None);

        // Late poll answers for the old game are dropped
        app.on_completion(
            Completion {
                ticket: Ticket::new(Purpose::Poll, Some("g1")),
                result: Ok(Reply::Snapshot(venns_round("voting"))),
            },
            T0,
        );
        assert!(matches!(app.screen, Screen::Lobby(_)));
        app.tick(T0);
        assert_eq!(only_job(&mut app).request, Request::ListGames);
    }

    #[test]
    fn test_name_editing() {
        let mut app = fresh(Variant::Phrase);
        app.lobby_char('x');
        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.name_input == "Ann"));

        app.lobby_tab();
        app.lobby_backspace();
        app.lobby_char('y');
        assert!(matches!(&app.screen, Screen::Lobby(lobby) if lobby.name_input == "Any"));
    }
}
