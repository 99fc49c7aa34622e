//! Lobby UI rendering
//!
//! Layout:
//! ┌─────────────────────────────────────────────────┐
//! │ ┌ Games ───────────────┐ ┌ Preview ───────────┐ │
//! │ │ > Game 3f2a91c0 (2)  │ │ Team A: Ann, Bob   │ │
//! │ │   Game 77d0e5b1 (4)  │ │ Team B: Cy         │ │
//! │ └──────────────────────┘ └────────────────────┘ │
//! │  Name: Ann_                     Team: A         │
//! └─────────────────────────────────────────────────┘

use crate::app::{GameView, LobbyFocus, LobbyState};
use crate::config::Variant;
use crate::game::phrase::{TEAM_A, TEAM_B};
use crate::game::Control;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the lobby body into `area`
pub fn render_lobby(
    frame: &mut Frame,
    area: Rect,
    lobby: &LobbyState,
    preview: Option<&GameView>,
    variant: Variant,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Games and preview
            Constraint::Length(3), // Name and team
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[0]);

    render_game_list(frame, columns[0], lobby);
    render_preview(frame, columns[1], preview);
    render_identity_fields(frame, layout[1], lobby, variant);
}

/// Footer hints for the lobby
pub fn lobby_footer(variant: Variant, focus: LobbyFocus, can_start: bool) -> String {
    let mut hints = vec!["↑↓ Select", "Enter Join"];
    match focus {
        LobbyFocus::Games => {
            hints.push("Tab Edit name");
            hints.push("C Create");
            if variant.has_teams() {
                hints.push("T Team");
            }
            hints.push("R Refresh");
            if can_start {
                hints.push(Control::StartGame.label());
            }
        }
        LobbyFocus::Name => hints.push("Tab Done"),
    }
    hints.push("Esc Quit");
    hints.join("  ")
}

fn render_game_list(frame: &mut Frame, area: Rect, lobby: &LobbyState) {
    let title = if lobby.is_joining() {
        "Games (joining...)"
    } else {
        "Games"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    if lobby.games.is_empty() {
        let empty = Paragraph::new("No open games. Press C to create one.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = lobby
        .games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            let selected = i == lobby.selected;
            let style = if selected && lobby.focus == LobbyFocus::Games {
                Style::default().fg(Color::Yellow).bold()
            } else if selected {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };
            let prefix = if selected { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, game.label())).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_preview(frame: &mut Frame, area: Rect, preview: Option<&GameView>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title("Preview");

    let mut lines: Vec<Line> = Vec::new();
    match preview {
        None | Some(GameView::Loading) => {
            lines.push(Line::styled("...", Style::default().fg(Color::DarkGray)));
        }
        Some(GameView::Phrase(view)) => {
            if let Some(problem) = &view.problem {
                lines.push(Line::styled(problem.clone(), Style::default().fg(Color::Red)));
            } else {
                lines.push(Line::styled(
                    format!("Team {}: {}", TEAM_A, roster(&view.team_a)),
                    Style::default().fg(Color::Cyan),
                ));
                lines.push(Line::styled(
                    format!("Team {}: {}", TEAM_B, roster(&view.team_b)),
                    Style::default().fg(Color::Magenta),
                ));
            }
        }
        Some(GameView::Venns(view)) => {
            if let Some(problem) = &view.problem {
                lines.push(Line::styled(problem.clone(), Style::default().fg(Color::Red)));
            } else {
                let names: Vec<String> = view.standings.iter().map(|s| s.name.clone()).collect();
                lines.push(Line::styled(
                    format!("Players: {}", roster(&names)),
                    Style::default().fg(Color::Cyan),
                ));
            }
        }
    }

    if preview.is_some_and(|view| view.allows(Control::StartGame)) {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            Control::StartGame.label(),
            Style::default().fg(Color::Yellow).bold(),
        ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_identity_fields(frame: &mut Frame, area: Rect, lobby: &LobbyState, variant: Variant) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(12)])
        .split(inner);

    let editing = lobby.focus == LobbyFocus::Name;
    let name = Paragraph::new(format!(
        "Name: {}{}",
        lobby.name_input,
        if editing { "_" } else { "" }
    ))
    .style(if editing {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::White)
    });
    frame.render_widget(name, columns[0]);

    if variant.has_teams() {
        let team = Paragraph::new(format!("Team: {}", lobby.team))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Right);
        frame.render_widget(team, columns[1]);
    }
}

fn roster(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
