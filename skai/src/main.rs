//! skai - disaster response dashboard
//!
//! Terminal UI for walking satellite imagery through the damage assessment
//! pipeline: upload, GAN enhancement, SKAI analysis, AI summary and report.

mod app;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use skai_core::logging::{self, LogTarget};
use skai_core::{Config, Dashboard};
use tokio::runtime::Runtime;

use crate::app::App;

fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard = logging::init(&config.logging, LogTarget::file_only("skai"))
        .context("failed to initialize logging")?;

    tracing::info!("skai TUI starting up");

    // Mock operations run as tokio tasks; the render loop stays synchronous.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let _runtime_guard = runtime.enter();

    tracing::info!(path = %Config::database_path().display(), "Opening database");
    let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;

    if let Some(session) = dashboard.restore() {
        tracing::info!(user = %session.username, "Restored previous session");
    }

    let mut app = App::new(dashboard);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, &runtime);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("skai TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    runtime: &Runtime,
) -> Result<()> {
    loop {
        // Apply finished operations and chat replies
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Sign-in waits out the simulated latency; redraw first so the
        // "authenticating" state is visible.
        if let Some((identifier, secret)) = app.take_login_request() {
            terminal.draw(|frame| ui::render(frame, app))?;
            let result = runtime.block_on(app.dashboard.login(&identifier, &secret));
            app.finish_login(result);
            continue;
        }

        // Handle events
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
