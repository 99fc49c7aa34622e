//! Application state and core logic

pub mod screen;
pub mod state;

pub use screen::{AppCoordinator, LobbyFocus, LobbyState, Screen, Settings};
pub use state::{GameSession, GameView};
