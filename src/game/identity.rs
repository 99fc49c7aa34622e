//! The locally remembered player identity

use serde::{Deserialize, Serialize};

/// Who this client is inside one game.
///
/// Established once when the server accepts a join and never edited
/// afterwards; leaving or a failed reconnect discards it entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub player_id: String,
    /// Sent as `X-Session-Token` on every authenticated call
    pub session_token: String,
    pub game_id: String,
    pub player_name: String,
    /// Team letter (`A`/`B`), phrase game only
    pub team: Option<String>,
}

impl LocalIdentity {
    /// Whether this identity belongs to `game_id`
    pub fn is_for(&self, game_id: &str) -> bool {
        self.game_id == game_id
    }
}
