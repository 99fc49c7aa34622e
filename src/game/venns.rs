//! Venns word-association game: snapshot mirror and view derivation
//!
//! Every round each player is dealt two words. The others submit phrases
//! linking them, each player votes for the best phrase about their own pair,
//! and the server awards points. Rounds cycle through
//! `submitting -> voting -> finished -> submitting`, always on the server's
//! say-so.

use super::{null_as_default, Control, GameState, LocalIdentity, Observed, StartPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Phrases every player needs about their pair before voting opens
pub const SUBMISSIONS_NEEDED: u32 = 3;

/// The server refuses to start with fewer players
pub const MIN_PLAYERS_TO_START: usize = 3;

/// Stage of the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Submitting,
    Voting,
    Finished,
}

/// One phrase submitted about someone's word pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub to_player: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phrase: String,
    #[serde(default)]
    pub from_player: Option<String>,
}

/// Server-side state of one Venns game
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VennsSnapshot {
    #[serde(default, alias = "gameId")]
    pub game_id: Option<String>,
    pub state: GameState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_names: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: BTreeMap<String, i64>,
    #[serde(default, alias = "current_round")]
    pub round: Option<u32>,
    #[serde(default)]
    pub round_status: Option<RoundStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub word_pairs: BTreeMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submissions: BTreeMap<String, Submission>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: BTreeMap<String, String>,
}

impl VennsSnapshot {
    pub fn name_of<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.player_names
            .get(player_id)
            .map(String::as_str)
            .unwrap_or(player_id)
    }

    pub fn score(&self, player_id: &str) -> i64 {
        self.scores.get(player_id).copied().unwrap_or(0)
    }

    /// Word pair dealt to `player_id`
    pub fn word_pair(&self, player_id: &str) -> Option<WordPair> {
        self.word_pairs.get(player_id).map(|words| WordPair::from_words(words))
    }

    /// Players in join order, followed by anyone only known from a word pair
    fn known_players(&self) -> Vec<&str> {
        let mut known: Vec<&str> = self.players.iter().map(String::as_str).collect();
        for id in self.word_pairs.keys() {
            if !known.contains(&id.as_str()) {
                known.push(id);
            }
        }
        known
    }
}

/// Two words dealt to a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair(pub String, pub String);

impl WordPair {
    fn from_words(words: &[String]) -> Self {
        let word = |i: usize| words.get(i).cloned().unwrap_or_else(|| "?".to_string());
        WordPair(word(0), word(1))
    }

    fn unknown() -> Self {
        WordPair("?".to_string(), "?".to_string())
    }
}

/// Another player's pair we can write a phrase for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherPair {
    pub player_id: String,
    pub name: String,
    pub pair: WordPair,
}

/// Progress towards the submission quota for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub submitted: u32,
    pub needed: u32,
}

/// A phrase about our own pair, as returned by `get_submissions_for_player`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhraseChoice {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phrase: String,
}

/// One row of the scoreboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub player_id: String,
    pub name: String,
    pub score: i64,
}

/// Count submissions per target over every known player.
///
/// Submissions aimed at a player nobody knows about are not counted.
pub fn submission_status(snapshot: &VennsSnapshot) -> BTreeMap<String, SubmissionStatus> {
    let mut status: BTreeMap<String, SubmissionStatus> = snapshot
        .known_players()
        .into_iter()
        .map(|id| {
            (
                id.to_string(),
                SubmissionStatus {
                    submitted: 0,
                    needed: SUBMISSIONS_NEEDED,
                },
            )
        })
        .collect();

    for submission in snapshot.submissions.values() {
        if let Some(entry) = submission
            .to_player
            .as_deref()
            .and_then(|target| status.get_mut(target))
        {
            entry.submitted += 1;
        }
    }

    status
}

/// Which finished round the ledger last settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Settled {
    round: Option<u32>,
}

/// Client-held score baseline used to show per-round points.
///
/// The server only reports cumulative totals, so the client remembers the
/// totals it saw when it last entered a finished phase. Starts at zero on
/// join; only a freshly entered finished phase moves it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreLedger {
    baseline: BTreeMap<String, i64>,
    round_points: BTreeMap<String, i64>,
    settled: Option<Settled>,
}

impl ScoreLedger {
    /// Fold a new snapshot into the ledger, returning the updated ledger.
    ///
    /// Entering `finished` (from another status, or for a new round number)
    /// computes `round_points = scores - baseline` and moves the baseline.
    /// Seeing the same finished round again changes nothing.
    pub fn observe(&self, snapshot: &VennsSnapshot) -> ScoreLedger {
        let mut next = self.clone();

        if snapshot.round_status != Some(RoundStatus::Finished) {
            next.settled = None;
            return next;
        }

        let fresh = match self.settled {
            None => true,
            Some(settled) => settled.round != snapshot.round,
        };
        if !fresh {
            return next;
        }

        next.round_points = snapshot
            .scores
            .iter()
            .map(|(player, score)| {
                let before = self.baseline.get(player).copied().unwrap_or(0);
                (player.clone(), score - before)
            })
            .collect();
        next.baseline = snapshot.scores.clone();
        next.settled = Some(Settled {
            round: snapshot.round,
        });
        next
    }

    /// Points earned in the last settled round
    pub fn round_points(&self) -> &BTreeMap<String, i64> {
        &self.round_points
    }
}

/// Which screen the Venns client should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VennsScreen {
    /// Not joined to this game
    Lobby,
    /// Joined, game not started yet
    Waiting,
    /// Game active but the server has not opened a round yet
    RoundPending,
    Submitting,
    Voting,
    Finished,
    /// The last snapshot cannot be trusted
    SnapshotUnavailable,
}

/// Everything a renderer needs for the Venns game
#[derive(Debug, Clone, PartialEq)]
pub struct VennsView {
    pub screen: VennsScreen,
    pub controls: BTreeSet<Control>,
    pub round: Option<u32>,
    /// Scoreboard, highest score first
    pub standings: Vec<Standing>,
    pub my_word_pair: Option<WordPair>,
    pub other_word_pairs: Vec<OtherPair>,
    pub submission_status: BTreeMap<String, SubmissionStatus>,
    pub phrases_for_my_pair: Vec<PhraseChoice>,
    pub voted_phrase_id: Option<String>,
    pub round_points: BTreeMap<String, i64>,
    pub problem: Option<String>,
}

impl VennsView {
    fn empty(screen: VennsScreen) -> Self {
        Self {
            screen,
            controls: BTreeSet::new(),
            round: None,
            standings: Vec::new(),
            my_word_pair: None,
            other_word_pairs: Vec::new(),
            submission_status: BTreeMap::new(),
            phrases_for_my_pair: Vec::new(),
            voted_phrase_id: None,
            round_points: BTreeMap::new(),
            problem: None,
        }
    }

    pub fn allows(&self, control: Control) -> bool {
        self.controls.contains(&control)
    }
}

/// Whether the start-game control is offered for this snapshot
pub fn can_start(
    snapshot: &VennsSnapshot,
    identity: Option<&LocalIdentity>,
    policy: StartPolicy,
) -> bool {
    if snapshot.state != GameState::Waiting || snapshot.players.len() < MIN_PLAYERS_TO_START {
        return false;
    }
    match policy {
        StartPolicy::AnyPlayer => true,
        StartPolicy::CreatorOnly => identity
            .is_some_and(|me| snapshot.players.first() == Some(&me.player_id)),
    }
}

/// Derive the Venns view.
///
/// `phrases` is the side-channel list of phrases about our own pair, which
/// the snapshot does not carry.
pub fn derive(
    observed: &Observed<VennsSnapshot>,
    identity: Option<&LocalIdentity>,
    ledger: &ScoreLedger,
    phrases: &[PhraseChoice],
    policy: StartPolicy,
) -> VennsView {
    let snapshot = match observed {
        Observed::Ready(snapshot) => snapshot,
        Observed::Unavailable { reason } => {
            let mut view = VennsView::empty(VennsScreen::SnapshotUnavailable);
            view.problem = Some(reason.clone());
            return view;
        }
    };

    let mut view = VennsView::empty(VennsScreen::RoundPending);
    view.round = snapshot.round;
    view.standings = standings(snapshot);

    let joined = identity.filter(|me| snapshot.game_id.as_deref().map_or(true, |id| me.is_for(id)));
    if can_start(snapshot, joined, policy) {
        view.controls.insert(Control::StartGame);
    }
    let Some(me) = joined else {
        view.screen = VennsScreen::Lobby;
        return view;
    };
    if snapshot.state == GameState::Waiting {
        view.screen = VennsScreen::Waiting;
        return view;
    }
    // Finished or archived: standings stay visible, nothing to play
    if snapshot.state == GameState::Other {
        view.screen = VennsScreen::SnapshotUnavailable;
        return view;
    }

    match snapshot.round_status {
        None => {}
        Some(RoundStatus::Submitting) => {
            view.screen = VennsScreen::Submitting;
            view.my_word_pair = Some(snapshot.word_pair(&me.player_id).unwrap_or_else(WordPair::unknown));
            view.other_word_pairs = other_pairs(snapshot, &me.player_id);
            view.submission_status = submission_status(snapshot);
            if !view.other_word_pairs.is_empty() {
                view.controls.insert(Control::SubmitPhrase);
            }
        }
        Some(RoundStatus::Voting) => {
            view.screen = VennsScreen::Voting;
            view.my_word_pair = Some(snapshot.word_pair(&me.player_id).unwrap_or_else(WordPair::unknown));
            view.phrases_for_my_pair = phrases.to_vec();
            view.voted_phrase_id = snapshot.votes.get(&me.player_id).cloned();
            view.controls.insert(Control::Vote);
        }
        Some(RoundStatus::Finished) => {
            view.screen = VennsScreen::Finished;
            view.round_points = ledger.round_points().clone();
            view.controls.insert(Control::StartNextRound);
        }
    }

    view
}

fn other_pairs(snapshot: &VennsSnapshot, me: &str) -> Vec<OtherPair> {
    snapshot
        .known_players()
        .into_iter()
        .filter(|id| *id != me)
        .filter_map(|id| {
            snapshot.word_pair(id).map(|pair| OtherPair {
                player_id: id.to_string(),
                name: snapshot.name_of(id).to_string(),
                pair,
            })
        })
        .collect()
}

fn standings(snapshot: &VennsSnapshot) -> Vec<Standing> {
    let mut rows: Vec<Standing> = snapshot
        .players
        .iter()
        .map(|id| Standing {
            player_id: id.clone(),
            name: snapshot.name_of(id).to_string(),
            score: snapshot.score(id),
        })
        .collect();
    // Stable sort keeps join order among ties
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows
}
