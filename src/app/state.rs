//! Per-game client state
//!
//! A `GameSession` holds what the client knows about the one game it has
//! joined: the identity, the last snapshot, the Venns ledger and the bits
//! of input the player is typing. Views are re-derived from it on demand.

use crate::config::Variant;
use crate::game::phrase::{self, PhraseSnapshot, PhraseView};
use crate::game::venns::{self, PhraseChoice, RoundStatus, ScoreLedger, VennsSnapshot, VennsView};
use crate::game::{LocalIdentity, Millis, Observed, StartPolicy};
use serde_json::Value;

/// Longest phrase the compose box accepts
pub const MAX_PHRASE_LEN: usize = 80;

/// The last snapshot, interpreted for the variant being played
#[derive(Debug, Clone, PartialEq)]
pub enum Board {
    /// Nothing fetched yet
    Pending,
    Phrase(Observed<PhraseSnapshot>),
    Venns(Observed<VennsSnapshot>),
}

/// What a renderer gets for the game screen
#[derive(Debug, Clone, PartialEq)]
pub enum GameView {
    Loading,
    Phrase(PhraseView),
    Venns(VennsView),
}

impl GameView {
    /// Whether the current screen offers `control`
    pub fn allows(&self, control: crate::game::Control) -> bool {
        match self {
            GameView::Loading => false,
            GameView::Phrase(view) => view.allows(control),
            GameView::Venns(view) => view.allows(control),
        }
    }
}

/// What changed when a snapshot was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotChange {
    /// The ledger moved and should be saved
    pub ledger_changed: bool,
}

/// Client state for the game we have joined
#[derive(Debug, Clone)]
pub struct GameSession {
    pub identity: LocalIdentity,
    pub board: Board,
    pub ledger: ScoreLedger,
    /// Phrases written about our own word pair (voting only)
    pub phrases: Vec<PhraseChoice>,
    /// `phrases` reflects the server for the current voting phase
    pub phrases_loaded: bool,
    /// A phrase fetch is in flight
    pub phrases_pending: bool,
    /// Row highlighted in the target or phrase list
    pub cursor: usize,
    /// Phrase being typed
    pub draft: String,
    last_round_status: Option<RoundStatus>,
}

impl GameSession {
    pub fn new(identity: LocalIdentity, ledger: ScoreLedger) -> Self {
        Self {
            identity,
            board: Board::Pending,
            ledger,
            phrases: Vec::new(),
            phrases_loaded: false,
            phrases_pending: false,
            cursor: 0,
            draft: String::new(),
            last_round_status: None,
        }
    }

    /// Interpret a raw `get_game` payload and fold it into the session
    pub fn apply_snapshot(&mut self, variant: Variant, value: &Value) -> SnapshotChange {
        let mut change = SnapshotChange::default();

        match variant {
            Variant::Phrase => {
                self.board = Board::Phrase(Observed::from_json(value));
            }
            Variant::Venns => {
                let observed: Observed<VennsSnapshot> = Observed::from_json(value);
                if let Some(snapshot) = observed.ready() {
                    let ledger = self.ledger.observe(snapshot);
                    change.ledger_changed = ledger != self.ledger;
                    self.ledger = ledger;

                    let status = snapshot.round_status;
                    if status != self.last_round_status {
                        // Lists and cursor belong to the previous phase
                        self.phrases.clear();
                        self.phrases_loaded = false;
                        self.cursor = 0;
                    }
                    self.last_round_status = status;
                }
                self.board = Board::Venns(observed);
            }
        }

        change
    }

    /// Whether the voting list still has to be fetched
    pub fn needs_phrases(&self) -> bool {
        self.last_round_status == Some(RoundStatus::Voting)
            && !self.phrases_loaded
            && !self.phrases_pending
    }

    /// Take a fetched voting list
    pub fn set_phrases(&mut self, phrases: Vec<PhraseChoice>) {
        self.cursor = self.cursor.min(phrases.len().saturating_sub(1));
        self.phrases = phrases;
        self.phrases_loaded = true;
    }

    /// Whether a snapshot has been received and can be trusted
    #[cfg(test)]
    pub fn has_snapshot(&self) -> bool {
        match &self.board {
            Board::Pending => false,
            Board::Phrase(observed) => observed.ready().is_some(),
            Board::Venns(observed) => observed.ready().is_some(),
        }
    }

    pub fn view(&self, now: Millis, policy: StartPolicy) -> GameView {
        match &self.board {
            Board::Pending => GameView::Loading,
            Board::Phrase(observed) => {
                GameView::Phrase(phrase::derive(observed, Some(&self.identity), now, policy))
            }
            Board::Venns(observed) => GameView::Venns(venns::derive(
                observed,
                Some(&self.identity),
                &self.ledger,
                &self.phrases,
                policy,
            )),
        }
    }

    /// Move the list highlight, staying within `len` rows
    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn type_char(&mut self, c: char) {
        if self.draft.chars().count() < MAX_PHRASE_LEN {
            self.draft.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.draft.pop();
    }
}
