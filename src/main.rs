mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thor_globe::config::GlobeConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "globe.json";
const DEFAULT_LOG: &str = "thor-globe.log";

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let mut config = GlobeConfig::from_file(&config_path)?;
    if let Some(base) = config_path.parent() {
        config.resolve_paths(base);
    }
    init_logging(config.log_file.as_deref())?;
    tracing::info!(config = %config_path.display(), "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// The terminal is in raw mode, so logs go to a file. Filter with `RUST_LOG`.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(Path::new(DEFAULT_LOG));
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Handle mouse events for rotating, zooming and hovering
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        // Click and drag to rotate
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        MouseEventKind::Moved => app.pointer(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Rotate with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.rotate(1.0, 0.0),
        KeyCode::Right | KeyCode::Char('l') => app.rotate(-1.0, 0.0),
        KeyCode::Up | KeyCode::Char('k') => app.rotate(0.0, 1.0),
        KeyCode::Down | KeyCode::Char('j') => app.rotate(0.0, -1.0),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Layer toggles
        KeyCode::Char('p') | KeyCode::Char('P') => app.toggle_paths(),
        KeyCode::Char('o') | KeyCode::Char('O') => app.toggle_takeoffs(),
        KeyCode::Char('t') | KeyCode::Char('T') => app.toggle_targets(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_graticule(),

        KeyCode::Char('r') | KeyCode::Char('R') => app.reload(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.clear_markers(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: GlobeConfig) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, size.width, size.height);
    app.reload();

    let mut last_frame = Instant::now();
    let mut dirty = true;
    loop {
        // Only repaint after input, a finished load or a running hover transition
        if dirty {
            terminal.draw(|frame| ui::render(frame, &app))?;
            dirty = false;
        }

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
            dirty = true;
        }

        let now = Instant::now();
        dirty |= app.tick(now - last_frame);
        last_frame = now;

        if app.should_quit {
            break;
        }
    }

    tracing::info!("quit");
    Ok(())
}
