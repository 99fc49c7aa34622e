//! Phrase team game: snapshot mirror and view derivation
//!
//! Two teams take timed turns. The active player reads a phrase and word to
//! their team; the opposing team watches the same card and awards points.
//! The server sends the card to every poller once the turn is ready, and the
//! view only decides who gets a screen that shows it.

use super::countdown::{deserialize_deadline, seconds_remaining};
use super::{null_as_default, Control, GameState, LocalIdentity, Millis, Observed, StartPolicy};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Minimum players across both teams before a game may start
pub const MIN_PLAYERS_TO_START: usize = 4;

/// Team letters used by the server
pub const TEAM_A: &str = "A";
pub const TEAM_B: &str = "B";

/// Server-side state of one phrase game
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseSnapshot {
    #[serde(default, rename = "game_id", alias = "gameId")]
    pub game_id: Option<String>,
    pub state: GameState,
    #[serde(default, rename = "teamA", deserialize_with = "null_as_default")]
    pub team_a: Vec<String>,
    #[serde(default, rename = "teamB", deserialize_with = "null_as_default")]
    pub team_b: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub current_turn: Option<String>,
    #[serde(default)]
    pub current_team: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub turn_ready: bool,
    #[serde(default)]
    pub current_phrase: Option<String>,
    #[serde(default)]
    pub current_word: Option<String>,
    #[serde(default, deserialize_with = "deserialize_deadline")]
    pub turn_end_time: Option<Millis>,
    #[serde(default, rename = "player_names", deserialize_with = "null_as_default")]
    pub player_names: BTreeMap<String, String>,
}

impl PhraseSnapshot {
    /// Players across both teams
    pub fn player_count(&self) -> usize {
        self.team_a.len() + self.team_b.len()
    }

    /// Score for a team letter, zero when the server has none
    pub fn score(&self, team: &str) -> i64 {
        self.scores.get(team).copied().unwrap_or(0)
    }

    /// The team whose turn it is. The server starts with `A` when unset.
    pub fn current_team(&self) -> &str {
        self.current_team.as_deref().unwrap_or(TEAM_A)
    }

    /// Whether `player_id` heads either team list
    pub fn is_creator(&self, player_id: &str) -> bool {
        self.team_a.first().map(String::as_str) == Some(player_id)
            || self.team_b.first().map(String::as_str) == Some(player_id)
    }

    /// Display name for a player id, falling back to the id itself
    pub fn name_of<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.player_names
            .get(player_id)
            .map(String::as_str)
            .unwrap_or(player_id)
    }
}

/// The other team letter
pub fn opponent_of(team: &str) -> &'static str {
    if team == TEAM_A {
        TEAM_B
    } else {
        TEAM_A
    }
}

/// Which screen the phrase client should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseScreen {
    /// Not joined to this game
    Lobby,
    /// Joined, game not started yet
    WaitingForTurn,
    /// Our turn, waiting for us to press ready
    ActiveTurnPreReady,
    /// Our turn, reading the card to the team
    ActiveTurnPlaying,
    /// The other team is playing; we award points
    OpposingTurnScoring,
    /// Someone else's turn and nothing for us to do
    OtherWaiting,
    /// The last snapshot cannot be trusted
    SnapshotUnavailable,
}

/// The card currently in play
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Card {
    pub phrase: String,
    pub word: String,
}

/// Everything a renderer needs for the phrase game
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseView {
    pub screen: PhraseScreen,
    pub countdown: Option<u64>,
    pub controls: BTreeSet<Control>,
    pub score_a: i64,
    pub score_b: i64,
    pub current_team: String,
    pub current_player: Option<String>,
    pub card: Option<Card>,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    /// Why the snapshot was rejected, for `SnapshotUnavailable`
    pub problem: Option<String>,
}

impl PhraseView {
    fn unavailable(reason: &str) -> Self {
        Self {
            screen: PhraseScreen::SnapshotUnavailable,
            countdown: None,
            controls: BTreeSet::new(),
            score_a: 0,
            score_b: 0,
            current_team: TEAM_A.to_string(),
            current_player: None,
            card: None,
            team_a: Vec::new(),
            team_b: Vec::new(),
            problem: Some(reason.to_string()),
        }
    }

    pub fn allows(&self, control: Control) -> bool {
        self.controls.contains(&control)
    }
}

/// Whether the start-game control is offered for this snapshot
pub fn can_start(
    snapshot: &PhraseSnapshot,
    identity: Option<&LocalIdentity>,
    policy: StartPolicy,
) -> bool {
    if snapshot.state != GameState::Waiting || snapshot.player_count() < MIN_PLAYERS_TO_START {
        return false;
    }
    match policy {
        StartPolicy::AnyPlayer => true,
        StartPolicy::CreatorOnly => identity.is_some_and(|me| snapshot.is_creator(&me.player_id)),
    }
}

/// Derive the phrase view from the last observed snapshot.
///
/// `identity` is `None` when this client has not joined the observed game.
pub fn derive(
    observed: &Observed<PhraseSnapshot>,
    identity: Option<&LocalIdentity>,
    now: Millis,
    policy: StartPolicy,
) -> PhraseView {
    let snapshot = match observed {
        Observed::Ready(snapshot) => snapshot,
        Observed::Unavailable { reason } => return PhraseView::unavailable(reason),
    };

    let current_team = snapshot.current_team().to_string();
    let mut view = PhraseView {
        screen: PhraseScreen::OtherWaiting,
        countdown: None,
        controls: BTreeSet::new(),
        score_a: snapshot.score(TEAM_A),
        score_b: snapshot.score(TEAM_B),
        current_team: current_team.clone(),
        current_player: snapshot
            .current_turn
            .as_deref()
            .map(|id| snapshot.name_of(id).to_string()),
        card: None,
        team_a: snapshot.team_a.iter().map(|id| snapshot.name_of(id).to_string()).collect(),
        team_b: snapshot.team_b.iter().map(|id| snapshot.name_of(id).to_string()).collect(),
        problem: None,
    };

    let joined = identity.filter(|me| snapshot.game_id.as_deref().map_or(true, |id| me.is_for(id)));

    if can_start(snapshot, joined, policy) {
        view.controls.insert(Control::StartGame);
    }
    let Some(me) = joined else {
        view.screen = PhraseScreen::Lobby;
        return view;
    };
    if snapshot.state == GameState::Waiting {
        view.screen = PhraseScreen::WaitingForTurn;
        return view;
    }
    // Finished or archived: scores stay visible, nothing to play
    if snapshot.state == GameState::Other {
        view.screen = PhraseScreen::SnapshotUnavailable;
        return view;
    }

    let is_active_player = snapshot.current_turn.as_deref() == Some(me.player_id.as_str());
    let is_opposing_team = me
        .team
        .as_deref()
        .is_some_and(|team| team != current_team);

    let countdown = snapshot
        .turn_end_time
        .map(|deadline| seconds_remaining(deadline, now));
    let card = Card {
        phrase: snapshot.current_phrase.clone().unwrap_or_default(),
        word: snapshot.current_word.clone().unwrap_or_default(),
    };

    if is_active_player && !snapshot.turn_ready {
        view.screen = PhraseScreen::ActiveTurnPreReady;
        view.controls.insert(Control::Ready);
    } else if is_active_player {
        view.screen = PhraseScreen::ActiveTurnPlaying;
        view.controls.insert(Control::EndTurn);
        view.countdown = countdown;
        view.card = Some(card);
    } else if is_opposing_team && snapshot.turn_ready {
        view.screen = PhraseScreen::OpposingTurnScoring;
        view.controls.extend([
            Control::AssignSelf1,
            Control::AssignSelf3,
            Control::AssignOpponent1,
        ]);
        view.countdown = countdown;
        view.card = Some(card);
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: Millis = 1_792_152_000_000;

    fn identity(player_id: &str, team: &str) -> LocalIdentity {
        LocalIdentity {
            player_id: player_id.to_string(),
            session_token: format!("tok-{}", player_id),
            game_id: "g1".to_string(),
            player_name: player_id.to_uppercase(),
            team: Some(team.to_string()),
        }
    }

    fn observe(value: serde_json::Value) -> Observed<PhraseSnapshot> {
        Observed::from_json(&value)
    }

    fn active_game(turn_ready: bool) -> Observed<PhraseSnapshot> {
        observe(json!({
            "game_id": "g1",
            "state": "active",
            "teamA": ["p1", "p2"],
            "teamB": ["p3", "p4"],
            "scores": {"A": 4, "B": 2},
            "currentTurn": "p1",
            "currentTeam": "A",
            "turnReady": turn_ready,
            "currentPhrase": "break the ice",
            "currentWord": "ice",
            "turnEndTime": NOW + 10_000,
        }))
    }

    #[test]
    fn test_active_player_before_ready() {
        let view = derive(&active_game(false), Some(&identity("p1", "A")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::ActiveTurnPreReady);
        assert_eq!(view.controls, BTreeSet::from([Control::Ready]));
        assert_eq!(view.countdown, None);
        assert_eq!(view.card, None);
    }

    #[test]
    fn test_active_player_playing() {
        let view = derive(&active_game(true), Some(&identity("p1", "A")), NOW + 3_000, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::ActiveTurnPlaying);
        assert_eq!(view.controls, BTreeSet::from([Control::EndTurn]));
        assert!(!view.allows(Control::AssignSelf1));
        assert_eq!(view.countdown, Some(7));
        assert_eq!(
            view.card,
            Some(Card {
                phrase: "break the ice".to_string(),
                word: "ice".to_string()
            })
        );
    }

    #[test]
    fn test_opposing_team_scores() {
        let view = derive(&active_game(true), Some(&identity("p3", "B")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::OpposingTurnScoring);
        assert_eq!(
            view.controls,
            BTreeSet::from([Control::AssignSelf1, Control::AssignSelf3, Control::AssignOpponent1])
        );
        assert!(!view.allows(Control::EndTurn));
        assert_eq!(view.countdown, Some(10));
        assert!(view.card.is_some());
    }

    #[test]
    fn test_opposing_team_before_ready_waits() {
        let view = derive(&active_game(false), Some(&identity("p3", "B")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::OtherWaiting);
        assert!(view.controls.is_empty());
    }

    #[test]
    fn test_teammate_waits_without_card() {
        let view = derive(&active_game(true), Some(&identity("p2", "A")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::OtherWaiting);
        assert!(view.controls.is_empty());
        assert_eq!(view.card, None);
        assert_eq!(view.countdown, None);
    }

    #[test]
    fn test_identity_without_team_is_never_opposing() {
        let mut me = identity("p3", "B");
        me.team = None;
        let view = derive(&active_game(true), Some(&me), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::OtherWaiting);
    }

    #[test]
    fn test_expired_timer_keeps_scoring_controls() {
        let view = derive(&active_game(true), Some(&identity("p3", "B")), NOW + 60_000, StartPolicy::AnyPlayer);
        assert_eq!(view.countdown, Some(0));
        assert!(view.allows(Control::AssignSelf3));
    }

    #[test]
    fn test_finished_game_offers_no_controls() {
        let observed = observe(json!({
            "game_id": "g1",
            "state": "finished",
            "teamA": ["p1", "p2"],
            "teamB": ["p3", "p4"],
            "scores": {"A": 9, "B": 7},
            "currentTurn": "p1",
            "currentTeam": "A",
            "turnReady": false,
        }));
        let view = derive(&observed, Some(&identity("p1", "A")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::SnapshotUnavailable);
        assert!(view.controls.is_empty());
        assert_eq!(view.card, None);
        assert_eq!((view.score_a, view.score_b), (9, 7));
    }

    #[test]
    fn test_error_snapshot_is_unavailable() {
        let view = derive(
            &observe(json!({"error": "Game not found"})),
            Some(&identity("p1", "A")),
            NOW,
            StartPolicy::AnyPlayer,
        );
        assert_eq!(view.screen, PhraseScreen::SnapshotUnavailable);
        assert!(view.controls.is_empty());
        assert_eq!(view.problem.as_deref(), Some("Game not found"));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let observed = observe(json!({
            "game_id": "g1",
            "state": "active",
            "currentTurn": "p1",
            "turnReady": true,
            "currentPhrase": null,
        }));
        let view = derive(&observed, Some(&identity("p1", "A")), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::ActiveTurnPlaying);
        assert_eq!(view.card, Some(Card::default()));
        assert_eq!((view.score_a, view.score_b), (0, 0));
        assert_eq!(view.countdown, None);
        assert_eq!(view.current_team, "A");
    }

    fn waiting_game(team_b: &[&str]) -> Observed<PhraseSnapshot> {
        observe(json!({
            "game_id": "g1",
            "state": "waiting",
            "teamA": ["p1", "p2"],
            "teamB": team_b,
        }))
    }

    #[test]
    fn test_start_needs_four_players() {
        let me = identity("p2", "A");
        let full = derive(&waiting_game(&["p3", "p4"]), Some(&me), NOW, StartPolicy::AnyPlayer);
        assert_eq!(full.screen, PhraseScreen::WaitingForTurn);
        assert!(full.allows(Control::StartGame));

        let short = derive(&waiting_game(&["p3"]), Some(&me), NOW, StartPolicy::AnyPlayer);
        assert!(!short.allows(Control::StartGame));
    }

    #[test]
    fn test_creator_only_policy() {
        let observed = waiting_game(&["p3", "p4"]);
        for (player, team, allowed) in [("p1", "A", true), ("p3", "B", true), ("p2", "A", false)] {
            let view = derive(&observed, Some(&identity(player, team)), NOW, StartPolicy::CreatorOnly);
            assert_eq!(view.allows(Control::StartGame), allowed, "player {}", player);
        }
        let lobby = derive(&observed, None, NOW, StartPolicy::CreatorOnly);
        assert_eq!(lobby.screen, PhraseScreen::Lobby);
        assert!(!lobby.allows(Control::StartGame));
    }

    #[test]
    fn test_lobby_observer_any_player_policy() {
        let view = derive(&waiting_game(&["p3", "p4"]), None, NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::Lobby);
        assert!(view.allows(Control::StartGame));
    }

    #[test]
    fn test_start_not_offered_once_active() {
        let view = derive(&active_game(false), None, NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::Lobby);
        assert!(!view.allows(Control::StartGame));
    }

    #[test]
    fn test_identity_for_other_game_is_lobby() {
        let mut me = identity("p1", "A");
        me.game_id = "other".to_string();
        let view = derive(&active_game(false), Some(&me), NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.screen, PhraseScreen::Lobby);
    }

    #[test]
    fn test_names_resolved() {
        let observed = observe(json!({
            "state": "active",
            "teamA": ["p1"],
            "currentTurn": "p1",
            "player_names": {"p1": "Alice"},
        }));
        let view = derive(&observed, None, NOW, StartPolicy::AnyPlayer);
        assert_eq!(view.current_player.as_deref(), Some("Alice"));
        assert_eq!(view.team_a, vec!["Alice".to_string()]);
    }

    #[test]
    fn test_opponent_of() {
        assert_eq!(opponent_of("A"), "B");
        assert_eq!(opponent_of("B"), "A");
    }
}
