//! UI rendering with ratatui
//!
//! Every screen shares the same frame: a header with the game title and
//! turn clock, the screen body, a one-line notice bar and a key-hint footer.

use super::lobby::{lobby_footer, render_lobby};
use crate::app::{AppCoordinator, GameSession, GameView, Screen};
use crate::game::phrase::{PhraseScreen, PhraseView, TEAM_A, TEAM_B};
use crate::game::venns::{VennsScreen, VennsView};
use crate::game::{Control, Millis};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the current screen
pub fn render(frame: &mut Frame, app: &AppCoordinator, now: Millis) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let footer = match &app.screen {
        Screen::Lobby(lobby) => {
            let preview = app.lobby_preview(now);
            render_header(frame, layout[0], app, None);
            render_lobby(frame, layout[1], lobby, preview.as_ref(), app.variant());
            let can_start = preview.is_some_and(|view| view.allows(Control::StartGame));
            lobby_footer(app.variant(), lobby.focus, can_start)
        }
        Screen::Reconnecting { identity } => {
            render_header(frame, layout[0], app, None);
            render_centered(
                frame,
                layout[1],
                &format!("Reconnecting to game {}...", identity.game_id),
                Color::DarkGray,
            );
            "L Leave  Esc Quit".to_string()
        }
        Screen::InGame(session) => {
            let view = app.game_view(now).unwrap_or(GameView::Loading);
            let countdown = match &view {
                GameView::Phrase(phrase) => phrase.countdown,
                _ => None,
            };
            render_header(frame, layout[0], app, countdown);
            match &view {
                GameView::Loading => {
                    render_centered(frame, layout[1], "Loading game...", Color::DarkGray)
                }
                GameView::Phrase(phrase) => render_phrase(frame, layout[1], phrase),
                GameView::Venns(venns) => render_venns(frame, layout[1], venns, session),
            }
            game_footer(&view)
        }
    };

    if let Some(notice) = &app.notice {
        let color = if notice.is_error { Color::Red } else { Color::Green };
        let bar = Paragraph::new(notice.text.as_str())
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);
        frame.render_widget(bar, layout[2]);
    }

    let footer = Paragraph::new(footer)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[3]);
}

/// Key hints for the in-game screen.
///
/// While a phrase is being typed letters go to the draft, so leaving
/// needs Ctrl+L.
pub fn game_footer(view: &GameView) -> String {
    let (controls, has_list) = match view {
        GameView::Loading => (Vec::new(), false),
        GameView::Phrase(phrase) => (phrase.controls.iter().copied().collect(), false),
        GameView::Venns(venns) => (
            venns.controls.iter().copied().collect(),
            venns.allows(Control::SubmitPhrase) || venns.allows(Control::Vote),
        ),
    };

    let mut hints: Vec<&str> = Vec::new();
    if has_list {
        hints.push("↑↓ Select");
    }
    for control in &controls {
        hints.push(control.label());
        if *control == Control::Ready {
            hints.push("T Start turn");
        }
    }
    if is_typing(view) {
        hints.push("Ctrl+L Leave");
    } else {
        hints.push("L Leave");
    }
    hints.push("Esc Quit");
    hints.join("  ")
}

/// Whether keystrokes go to the phrase draft
pub fn is_typing(view: &GameView) -> bool {
    view.allows(Control::SubmitPhrase)
}

/// Render the header: logo, game title, turn clock
fn render_header(frame: &mut Frame, area: Rect, app: &AppCoordinator, countdown: Option<u64>) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10), // Logo
            Constraint::Min(20),    // Title
            Constraint::Length(10), // Timer
        ])
        .split(inner);

    let logo = Paragraph::new("HUDDLE")
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Left);
    frame.render_widget(logo, header_layout[0]);

    let title = Paragraph::new(app.variant().title())
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center);
    frame.render_widget(title, header_layout[1]);

    if let Some(seconds) = countdown {
        let timer_color = if seconds <= 10 {
            Color::Red
        } else if seconds <= 30 {
            Color::Yellow
        } else {
            Color::Green
        };
        let timer = Paragraph::new(format_timer(seconds))
            .style(Style::default().fg(timer_color).bold())
            .alignment(Alignment::Right);
        frame.render_widget(timer, header_layout[2]);
    }
}

fn render_centered(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let message = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(message, layout[1]);
}

// Phrase game

fn render_phrase(frame: &mut Frame, area: Rect, view: &PhraseView) {
    if let Some(problem) = &view.problem {
        render_centered(frame, area, problem, Color::Red);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(30),    // Turn area
            Constraint::Length(26), // Teams
        ])
        .split(area);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Score
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Turn
            Constraint::Length(1), // Status
            Constraint::Length(1), // Spacer
            Constraint::Length(2), // Card
            Constraint::Min(0),
        ])
        .split(columns[0]);

    let score = Paragraph::new(format!(
        "Team {} {}  :  {} Team {}",
        TEAM_A, view.score_a, view.score_b, TEAM_B
    ))
    .style(Style::default().fg(Color::Magenta).bold())
    .alignment(Alignment::Center);
    frame.render_widget(score, main_layout[0]);

    let turn = match &view.current_player {
        Some(player) => format!("Team {} is up: {}", view.current_team, player),
        None => format!("Team {} is up", view.current_team),
    };
    frame.render_widget(
        Paragraph::new(turn).style(Style::default().fg(Color::White)),
        main_layout[2],
    );

    let (status, color) = phrase_status(view);
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(color)),
        main_layout[3],
    );

    if let Some(card) = &view.card {
        let lines = vec![
            Line::styled(format!("Phrase: {}", card.phrase), Style::default().fg(Color::Cyan).bold()),
            Line::styled(format!("Word:   {}", card.word), Style::default().fg(Color::Yellow).bold()),
        ];
        frame.render_widget(Paragraph::new(lines), main_layout[5]);
    }

    render_teams(frame, columns[1], view);
}

fn phrase_status(view: &PhraseView) -> (String, Color) {
    match view.screen {
        PhraseScreen::Lobby => ("You have not joined this game".to_string(), Color::DarkGray),
        PhraseScreen::WaitingForTurn => ("Waiting for the game to start...".to_string(), Color::DarkGray),
        PhraseScreen::ActiveTurnPreReady => ("Your turn! Press R when ready".to_string(), Color::Yellow),
        PhraseScreen::ActiveTurnPlaying => ("Get your team to guess the word".to_string(), Color::Green),
        PhraseScreen::OpposingTurnScoring => ("Score the other team's guesses".to_string(), Color::Cyan),
        PhraseScreen::OtherWaiting => ("Waiting for the turn to play out...".to_string(), Color::DarkGray),
        PhraseScreen::SnapshotUnavailable => ("Game unavailable".to_string(), Color::Red),
    }
}

fn render_teams(frame: &mut Frame, area: Rect, view: &PhraseView) {
    let mut items: Vec<ListItem> = Vec::new();
    for (team, members, color) in [
        (TEAM_A, &view.team_a, Color::Cyan),
        (TEAM_B, &view.team_b, Color::Magenta),
    ] {
        let marker = if team == view.current_team { "*" } else { " " };
        items.push(
            ListItem::new(format!("{}Team {}", marker, team)).style(Style::default().fg(color).bold()),
        );
        for name in members {
            let style = if view.current_player.as_deref() == Some(name.as_str()) {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            items.push(ListItem::new(format!("  {}", name)).style(style));
        }
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("Teams"),
    );
    frame.render_widget(list, area);
}

// Venns

fn render_venns(frame: &mut Frame, area: Rect, view: &VennsView, session: &GameSession) {
    if let Some(problem) = &view.problem {
        render_centered(frame, area, problem, Color::Red);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(30),    // Round area
            Constraint::Length(26), // Standings
        ])
        .split(area);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Round and pair
            Constraint::Length(1), // Spacer
            Constraint::Min(3),    // List
            Constraint::Length(1), // Draft
        ])
        .split(columns[0]);

    let round = view.round.map(|r| format!("Round {}", r)).unwrap_or_default();
    let heading = match &view.my_word_pair {
        Some(pair) => format!("{}  Your words: {} / {}", round, pair.0, pair.1),
        None => round,
    };
    frame.render_widget(
        Paragraph::new(heading).style(Style::default().fg(Color::Cyan).bold()),
        main_layout[0],
    );

    match view.screen {
        VennsScreen::Submitting => {
            let items: Vec<ListItem> = view
                .other_word_pairs
                .iter()
                .enumerate()
                .map(|(i, other)| {
                    let progress = view
                        .submission_status
                        .get(&other.player_id)
                        .map(|s| format!(" [{}/{}]", s.submitted, s.needed))
                        .unwrap_or_default();
                    let text = format!(
                        "{} - {} / {}{}",
                        other.name, other.pair.0, other.pair.1, progress
                    );
                    selectable(text, i == session.cursor)
                })
                .collect();
            render_list(frame, main_layout[2], items, "Write a phrase for");

            let draft = Paragraph::new(format!("> {}_", session.draft))
                .style(Style::default().fg(Color::White));
            frame.render_widget(draft, main_layout[3]);
        }
        VennsScreen::Voting => {
            let items: Vec<ListItem> = view
                .phrases_for_my_pair
                .iter()
                .enumerate()
                .map(|(i, choice)| {
                    let voted = view.voted_phrase_id.as_deref() == Some(choice.id.as_str());
                    let text = format!("{}{}", choice.phrase, if voted { "  (your vote)" } else { "" });
                    selectable(text, i == session.cursor)
                })
                .collect();
            render_list(frame, main_layout[2], items, "Pick the best phrase");
        }
        VennsScreen::Finished => {
            let items: Vec<ListItem> = view
                .standings
                .iter()
                .map(|standing| {
                    let points = view.round_points.get(&standing.player_id).copied().unwrap_or(0);
                    ListItem::new(format!("{}: +{}", standing.name, points))
                        .style(Style::default().fg(Color::Green))
                })
                .collect();
            render_list(frame, main_layout[2], items, "Round results");
        }
        VennsScreen::Lobby => render_centered(frame, main_layout[2], "You have not joined this game", Color::DarkGray),
        VennsScreen::Waiting => {
            render_centered(frame, main_layout[2], "Waiting for the game to start...", Color::DarkGray)
        }
        VennsScreen::RoundPending => {
            render_centered(frame, main_layout[2], "Waiting for the round to begin...", Color::DarkGray)
        }
        VennsScreen::SnapshotUnavailable => {
            render_centered(frame, main_layout[2], "Game unavailable", Color::Red)
        }
    }

    render_standings(frame, columns[1], view, &session.identity.player_id);
}

fn selectable(text: String, selected: bool) -> ListItem<'static> {
    if selected {
        ListItem::new(format!("> {}", text)).style(Style::default().fg(Color::Yellow).bold())
    } else {
        ListItem::new(format!("  {}", text)).style(Style::default().fg(Color::White))
    }
}

fn render_list(frame: &mut Frame, area: Rect, items: Vec<ListItem>, title: &str) {
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title.to_string()),
    );
    frame.render_widget(list, area);
}

/// Render the scoreboard (right panel)
fn render_standings(frame: &mut Frame, area: Rect, view: &VennsView, me: &str) {
    let items: Vec<ListItem> = view
        .standings
        .iter()
        .enumerate()
        .map(|(i, standing)| {
            let style = if standing.player_id == me {
                Style::default().fg(Color::Cyan).bold()
            } else if i == 0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{} - {}", standing.name, standing.score)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("Scoreboard"),
    );
    frame.render_widget(list, area);
}

/// Format the timer display
fn format_timer(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
