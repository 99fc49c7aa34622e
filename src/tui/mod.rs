//! Terminal UI module

mod lobby;
mod terminal;
mod ui;

pub use terminal::Tui;
pub use ui::{is_typing, render};
