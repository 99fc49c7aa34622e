//! Game state mirrors and view derivation
//!
//! Everything in here is pure: a snapshot fetched from the server plus the
//! locally remembered identity and a clock reading go in, a view value
//! comes out. Nothing here performs I/O.

pub mod countdown;
pub mod identity;
pub mod phrase;
pub mod venns;

pub use identity::LocalIdentity;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Milliseconds since the Unix epoch
pub type Millis = i64;

/// Wall-clock source used for countdowns and poll scheduling
pub trait Clock {
    fn now_millis(&self) -> Millis;
}

/// The real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to (for tests).
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock(std::cell::Cell<Millis>);

#[cfg(test)]
impl ManualClock {
    pub fn at(now: Millis) -> Self {
        Self(std::cell::Cell::new(now))
    }

    pub fn advance(&self, by: Millis) {
        self.0.set(self.0.get() + by);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> Millis {
        self.0.get()
    }
}

/// Lifecycle of a whole game as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Waiting,
    Active,
    #[serde(other)]
    Other,
}

/// A snapshot as last observed from the server.
///
/// A payload carrying an `error` marker, a payload that is not an object,
/// or one without a `state` field is never trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed<S> {
    Ready(S),
    Unavailable { reason: String },
}

impl<S: DeserializeOwned> Observed<S> {
    /// Interpret a raw `get_game` payload
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::unavailable("snapshot is not an object");
        };

        if let Some(error) = object.get("error") {
            let reason = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Self::unavailable(reason);
        }

        if !object.contains_key("state") {
            return Self::unavailable("snapshot has no state");
        }

        match S::deserialize(value) {
            Ok(snapshot) => Observed::Ready(snapshot),
            Err(e) => Self::unavailable(format!("malformed snapshot: {}", e)),
        }
    }
}

impl<S> Observed<S> {
    fn unavailable(reason: impl Into<String>) -> Self {
        Observed::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn ready(&self) -> Option<&S> {
        match self {
            Observed::Ready(snapshot) => Some(snapshot),
            Observed::Unavailable { .. } => None,
        }
    }

    /// Why the snapshot was rejected
    pub fn problem(&self) -> Option<&str> {
        match self {
            Observed::Ready(_) => None,
            Observed::Unavailable { reason } => Some(reason),
        }
    }
}

/// Who may press "start game" once enough players have joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StartPolicy {
    /// Any joined player (or an observer in the lobby)
    #[value(alias = "any")]
    AnyPlayer,
    /// Only the game's creator: the first player listed
    #[default]
    #[value(alias = "creator")]
    CreatorOnly,
}

/// A player action the current view allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    StartGame,
    Ready,
    EndTurn,
    AssignSelf1,
    AssignSelf3,
    AssignOpponent1,
    SubmitPhrase,
    Vote,
    StartNextRound,
}

impl Control {
    /// Key hint shown next to the control in the footer
    pub fn label(&self) -> &'static str {
        match self {
            Control::StartGame => "S Start game",
            Control::Ready => "R Ready",
            Control::EndTurn => "E End turn",
            Control::AssignSelf1 => "1 +1",
            Control::AssignSelf3 => "3 +3",
            Control::AssignOpponent1 => "O +1 to other team",
            Control::SubmitPhrase => "Enter Submit phrase",
            Control::Vote => "Enter Vote",
            Control::StartNextRound => "N Next round",
        }
    }
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
