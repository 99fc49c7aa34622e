//! huddle - terminal client for the phrase team game and Venns
//!
//! Join a game, keep in sync, play your turn.

mod app;
mod config;
mod game;
mod logging;
mod network;
mod storage;
mod tui;

use anyhow::{bail, Context, Result};
use app::{AppCoordinator, LobbyFocus, Screen, Settings};
use clap::Parser;
use config::{build_config, Args};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use game::{Clock, Control, Millis, SystemClock};
use network::{HttpGameServer, Worker};
use storage::Storage;
use tracing::info;
use tui::Tui;

fn main() -> Result<()> {
    let config = build_config(&Args::parse())?;

    let data_dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => Storage::data_dir()?,
    };
    let log_path = logging::init(&data_dir, config.log_level)?;

    let storage = Storage::open(Some(&data_dir)).context("failed to open local storage")?;
    let server = HttpGameServer::new(&config.server_url, config.request_timeout)?;
    info!(
        "starting {} against {} (log: {})",
        config.variant.as_str(),
        server.base_url(),
        log_path.display()
    );
    let mut worker = Worker::spawn(server);

    let clock = SystemClock;
    let settings = Settings {
        variant: config.variant,
        start_policy: config.start_policy,
        game_poll: config.game_poll,
        lobby_poll: config.lobby_poll,
    };
    let mut app = AppCoordinator::new(settings, storage, clock.now_millis());

    let mut terminal = Tui::new()?;
    terminal.enter()?;

    loop {
        let now = clock.now_millis();
        app.tick(now);
        for job in app.take_jobs() {
            worker.submit(job);
        }
        for completion in worker.drain() {
            app.on_completion(completion, clock.now_millis());
        }
        // Completions can queue follow-up requests
        for job in app.take_jobs() {
            worker.submit(job);
        }

        terminal.draw(|frame| tui::render(frame, &app, now))?;

        if event::poll(config.tick)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key, clock.now_millis());
                }
            }
        }

        if !worker.is_alive() {
            terminal.exit()?;
            bail!("request worker stopped unexpectedly");
        }
        if app.should_quit {
            break;
        }
    }

    info!("exiting");
    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}

fn handle_key(app: &mut AppCoordinator, key: KeyEvent, now: Millis) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }
    app.dismiss_notice();

    match &app.screen {
        Screen::Lobby(_) => handle_lobby_key(app, key, now),
        Screen::Reconnecting { .. } => match key.code {
            KeyCode::Esc => app.quit(),
            KeyCode::Char('l') | KeyCode::Char('L') => app.leave(now),
            _ => {}
        },
        Screen::InGame(_) => handle_game_key(app, key, ctrl, now),
    }
}

fn handle_lobby_key(app: &mut AppCoordinator, key: KeyEvent, now: Millis) {
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Up => app.lobby_up(),
        KeyCode::Down => app.lobby_down(),
        KeyCode::Tab => app.lobby_tab(),
        KeyCode::Enter => app.join_game(),
        KeyCode::Backspace => app.lobby_backspace(),
        KeyCode::Char(c) if app.lobby_focus() == Some(LobbyFocus::Name) => app.lobby_char(c),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'c' => app.create_game(),
            't' => app.lobby_toggle_team(),
            'r' => app.refresh_games(now),
            's' => app.start_game(now),
            'q' => app.quit(),
            _ => {}
        },
        _ => {}
    }
}

fn handle_game_key(app: &mut AppCoordinator, key: KeyEvent, ctrl: bool, now: Millis) {
    if ctrl {
        if key.code == KeyCode::Char('l') {
            app.leave(now);
        }
        return;
    }

    let typing = app.game_view(now).is_some_and(|view| tui::is_typing(&view));
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Up => app.game_up(now),
        KeyCode::Down => app.game_down(now),
        KeyCode::Enter => app.game_enter(now),
        KeyCode::Backspace => app.game_backspace(),
        KeyCode::Char(c) if typing => app.game_char(c),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            's' => app.start_game(now),
            'r' => app.ready_turn(now),
            't' => app.start_turn(now),
            'e' => app.end_turn(now),
            '1' => app.assign_points(Control::AssignSelf1, now),
            '3' => app.assign_points(Control::AssignSelf3, now),
            'o' => app.assign_points(Control::AssignOpponent1, now),
            'n' => app.start_next_round(now),
            'l' => app.leave(now),
            _ => {}
        },
        _ => {}
    }
}
