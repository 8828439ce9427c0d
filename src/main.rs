mod api;
mod app;
mod config;
mod format;
mod launch;
mod model;
mod thumbnail;
mod ui;

#[cfg(test)]
mod test_support;

use api::ApiClient;
use app::{App, FetchState, ModalAction};
use clap::Parser;
use config::{Config, DEFAULT_SERVER};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// TUI explorer for Plex media libraries
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the library server (serves /api/ and /thumbnail)
    #[arg(short, long, env = "LIBRARY_EXPLORER_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Log file path (defaults to the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

const TICK: Duration = Duration::from_millis(100);

/// Send logs to a file; the terminal belongs to the UI.
fn init_tracing(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::new(&cli.server, cli.log_file)?;

    init_tracing(&config.log_path);
    info!(server = %config.server, "starting library explorer");

    let client = ApiClient::new(config.server.clone())?;
    let mut app = App::new(client);
    app.start_fetch();

    // Init terminal
    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    app.update_viewport(size.width);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    app.shutdown();

    // Restore terminal
    ratatui::restore();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.poll_background();
        let mut visible = Vec::new();
        terminal.draw(|frame| visible = ui::render(app, frame))?;
        app.load_card_thumbnails(&visible);

        if app.should_quit {
            return Ok(());
        }

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(width, _) => {
                    app.update_viewport(width);
                }
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if key.code == KeyCode::Char('?') {
        app.show_help = true;
        return;
    }

    if app.modal_open() {
        if let Some(action) = modal_action(key) {
            app.handle_modal_action(action);
        }
        return;
    }

    if matches!(app.fetch, FetchState::Ready(_)) {
        handle_library_key(app, key);
    } else if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.should_quit = true;
    }
}

fn modal_action(key: KeyEvent) -> Option<ModalAction> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('q') => Some(ModalAction::Close),
        KeyCode::Char('o') => Some(ModalAction::OpenTrailer),
        KeyCode::Char('y') => Some(ModalAction::CopyTrailer),
        _ => None,
    }
}

fn handle_library_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Left | KeyCode::Char('h') => app.move_left(),
        KeyCode::Right | KeyCode::Char('l') => app.move_right(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Tab => app.next_section(),
        KeyCode::BackTab => app.prev_section(),
        KeyCode::Char('g') => app.jump_first(),
        KeyCode::Char('G') => app.jump_last(),
        KeyCode::Enter | KeyCode::Char(' ') => app.open_focused(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{envelope, item, offline_client};

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ready_app() -> App {
        let mut app = App::new(offline_client());
        app.finish_fetch(Ok(envelope(vec![(
            "Movies",
            vec![item("Heat"), item("Ronin")],
        )])));
        app.update_viewport(100);
        app
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["library-explorer"]).unwrap();
        assert!(cli.log_file.is_none());
        assert!(Config::new(&cli.server, None).is_ok());

        let cli = Cli::try_parse_from(["library-explorer", "--server", "http://nas:8000"]).unwrap();
        assert_eq!(cli.server, "http://nas:8000");
    }

    #[test]
    fn test_enter_opens_and_escape_closes() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.modal().unwrap().0.title, "Ronin");

        // Navigation keys go to the modal, not the grid.
        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor(), 1);

        press(&mut app, KeyCode::Esc);
        assert!(!app.modal_open());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_q_in_modal_only_closes() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.modal_open());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_quit_while_loading() {
        let mut app = App::new(offline_client());
        press(&mut app, KeyCode::Enter);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_modal() {
        let mut app = ready_app();
        press(&mut app, KeyCode::Enter);
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
