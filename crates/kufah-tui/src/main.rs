//! Kufah - a terminal client for school attendance administration.
//!
//! Teachers manage classes, rosters, attendance, daily ibadah goals, events
//! and questions. Students open their own attendance with their link token.

mod app;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kufah_core::Config;

use app::{App, AppState, LoginMode};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_NAME: &str = "kufah.log";

const USAGE: &str = "\
Usage: kufah [--token <link>]

Options:
  --token <link>  Open the student view with a personal link or token
  -h, --help      Print this help

Environment:
  KUFAH_API_URL           Backend base URL (default http://localhost:5000/api)
  KUFAH_TEACHER_USERNAME  Teacher login username
  KUFAH_TEACHER_PASSWORD  Teacher login password
  RUST_LOG                Log filter (default warn)";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run { token: Option<String> },
    Help,
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut token = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--token" => {
                let value = args.next().context("--token needs a value")?;
                token = Some(value);
            }
            other => match other.strip_prefix("--token=") {
                Some(value) => token = Some(value.to_string()),
                None => bail!("Unknown argument: {}\n\n{}", other, USAGE),
            },
        }
    }
    Ok(Command::Run { token })
}

/// Initialize file logging. The terminal belongs to the UI, so logs go to
/// `kufah.log` in the cache directory.
fn init_tracing() -> Result<WorkerGuard> {
    let log_dir = Config::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME));

    // RUST_LOG controls the level (e.g. RUST_LOG=kufah_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let token = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Run { token } => token,
    };

    let _log_guard = init_tracing()?;
    info!("Kufah starting");

    let config = Config::from_env();
    info!(api_url = %config.api_url, teacher_configured = config.teacher.is_some(), "Configuration loaded");
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start_login();
    if let Some(token) = token {
        app.login_mode = LoginMode::Student;
        app.login_token = token.clone();
        app.start_login();
        app.start_student_login(&token);
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("Kufah shutting down");
    Ok(())
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results get picked up
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let spawned tasks make progress on this worker between polls
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])).unwrap(), Command::Run { token: None });
        assert_eq!(parse_args(args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(
            parse_args(args(&["--token", "https://school.example/?token=abc"])).unwrap(),
            Command::Run {
                token: Some("https://school.example/?token=abc".to_string())
            }
        );
        assert_eq!(
            parse_args(args(&["--token=xyz"])).unwrap(),
            Command::Run {
                token: Some("xyz".to_string())
            }
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["--token"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
