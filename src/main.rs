mod app;
mod cli;
mod handlers;
mod ui;

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::{io, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use davomat::config::Config;
use davomat::sync::{AppActivity, SyncSnapshot};

use app::{App, ViewMode};
use cli::Cli;
use handlers::{handle_key_event, KeyAction};
use ui::{
    render_attendance_view, render_lesson_form_view, render_login_view, render_status_bar,
    render_timetable_view, LessonFormViewState, StatusBarState, TimetableViewState,
};

const LOG_ENV: &str = "DAVOMAT_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Logging disabled: {:#}", e);
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::info!("Using API at {}", config.api.base_url);

    if let Some(command) = cli.command {
        return cli::run(command, &config).await;
    }

    let mut app = App::new(config).await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    app.stop_sync();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{:?}", err);
    }

    Ok(())
}

/// The terminal UI owns stdout, so logs go to a file in the cache dir.
fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Failed to get cache directory")?
        .join("davomat");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("davomat.log"))
        .context("Failed to open log file")?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

enum LoopEvent {
    Terminal(Option<io::Result<Event>>),
    Tick,
    Snapshot(SyncSnapshot),
}

async fn next_snapshot(rx: &mut Option<watch::Receiver<SyncSnapshot>>) -> SyncSnapshot {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => rx.borrow_and_update().clone(),
            Err(_) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(app.config.ui.tick_rate_ms.max(10)));
    let mut snapshots: Option<watch::Receiver<SyncSnapshot>> = None;

    loop {
        if let Some(subscription) = app.take_subscription() {
            snapshots = subscription;
        }

        app.clear_expired_status();
        terminal.draw(|f| render_ui(f, app))?;

        let event = tokio::select! {
            event = events.next() => LoopEvent::Terminal(event),
            _ = tick.tick() => LoopEvent::Tick,
            snapshot = next_snapshot(&mut snapshots) => LoopEvent::Snapshot(snapshot),
        };

        match event {
            LoopEvent::Terminal(None) => return Ok(()),
            LoopEvent::Terminal(Some(event)) => match event? {
                Event::Key(key) => match handle_key_event(app, key).await {
                    KeyAction::Quit => return Ok(()),
                    KeyAction::Continue => {}
                },
                Event::FocusGained => app.set_activity(AppActivity::Foreground),
                Event::FocusLost => app.set_activity(AppActivity::Background),
                _ => {}
            },
            LoopEvent::Tick => app.poll_lookups().await,
            LoopEvent::Snapshot(snapshot) => app.apply_snapshot(snapshot),
        }
    }
}

fn render_ui(f: &mut Frame, app: &App) {
    let theme = app.theme.clone();

    let mut constraints = vec![Constraint::Length(3)]; // Header
    if app.show_debug {
        constraints.push(Constraint::Percentage(60)); // Main content
        constraints.push(Constraint::Min(5)); // Debug panel
    } else {
        constraints.push(Constraint::Min(10));
    }
    constraints.push(Constraint::Length(3)); // Status bar

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(f.area());

    let mut chunk_index = 0;

    // Header
    let header_text = format!(
        "Davomat - {}",
        match app.view_mode {
            ViewMode::Login => "Kirish",
            ViewMode::Timetable => "Dars jadvali",
            ViewMode::Attendance => "Davomat",
            ViewMode::LessonForm => "Yangi dars",
        }
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(theme.primary()).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(header, main_chunks[chunk_index]);
    chunk_index += 1;

    // Main content
    let content_area = main_chunks[chunk_index];
    match app.view_mode {
        ViewMode::Login => render_login_view(f, &app.login, content_area, &theme),
        ViewMode::Timetable => {
            if let Some(ref snapshot) = app.snapshot {
                let state = TimetableViewState {
                    snapshot,
                    selected: app.timetable.selected,
                };
                render_timetable_view(f, &state, content_area, &theme);
            }
        }
        ViewMode::Attendance => render_attendance_view(f, &app.attendance, content_area, &theme),
        ViewMode::LessonForm => {
            let state = LessonFormViewState {
                state: &app.lesson_form,
                date: app.current_date(),
            };
            render_lesson_form_view(f, &state, content_area, &theme);
        }
    }
    chunk_index += 1;

    // Debug panel (only shown when enabled)
    if app.show_debug {
        let debug_text: String = app
            .debug_log
            .iter()
            .rev()
            .take(10)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let debug_panel = Paragraph::new(debug_text)
            .style(Style::default().fg(theme.text_muted()))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Debug Log [d: hide | c: clear]")
                    .border_style(Style::default().fg(theme.border_normal())),
            );
        f.render_widget(debug_panel, main_chunks[chunk_index]);
        chunk_index += 1;
    }

    // Status bar
    let status_state = StatusBarState {
        view_mode: app.view_mode,
        is_editing: app.is_editing() && app.view_mode != ViewMode::Login,
        status_message: app
            .status_message
            .as_ref()
            .map(|m| (m.message.clone(), m.is_error)),
    };
    render_status_bar(f, &status_state, main_chunks[chunk_index], &theme);
}
