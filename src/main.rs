pub mod ui;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use glance::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Profile},
    library::Library,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, ReaderEvent, Runner},
    store::{DocumentStore, FileDocumentStore, MemoryDocumentStore},
    Session, Tick,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

const TICK_RATE_MS: u64 = 100;
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(2);

/// one word at a time, at the pace you set
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A rapid serial visual presentation reader: paste or open text and read it one word at a time at a fixed words-per-minute cadence."
)]
pub struct Cli {
    /// text files to open, one document each
    files: Vec<PathBuf>,

    /// text to read, opened as a new document
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// reading speed in words per minute
    #[clap(short = 'w', long)]
    wpm: Option<u32>,

    /// display scale of the current word
    #[clap(long)]
    font_scale: Option<f64>,

    /// display profile, picks the speed and zoom ranges
    #[clap(long, value_enum)]
    profile: Option<Profile>,

    /// maximum number of words kept per document
    #[clap(long)]
    max_words: Option<usize>,

    /// start with an empty library and do not save documents
    #[clap(long)]
    fresh: bool,

    /// log filter, e.g. `debug` (defaults to $GLANCE_LOG, then `info`)
    #[clap(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlay command line settings on the stored config
    fn apply_to(&self, config: &mut Config) {
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(wpm) = self.wpm {
            config.wpm = wpm;
        }
        if let Some(font_scale) = self.font_scale {
            config.font_scale = font_scale;
        }
        if let Some(max_words) = self.max_words {
            config.max_words = max_words;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reading,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub library: Library<Box<dyn DocumentStore>>,
    pub config: Config,
    pub mode: Mode,
    pub sidebar_open: bool,
}

impl App {
    pub fn new(library: Library<Box<dyn DocumentStore>>, config: Config) -> Self {
        Self {
            library,
            config,
            mode: Mode::Reading,
            sidebar_open: true,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.mode {
            Mode::Reading => self.handle_reading_key(key),
            Mode::Editing => {
                self.handle_editing_key(key);
                KeyOutcome::Continue
            }
        }
    }

    fn handle_reading_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let wpm_step = i64::from(self.config.wpm_step);
        let zoom_step = self.config.font_scale_step;
        let session = self.library.active_session_mut();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Char(' ') => session.toggle_play(),
            KeyCode::Left => session.seek_by(-1),
            KeyCode::Right => session.seek_by(1),
            KeyCode::Home => session.seek(0),
            KeyCode::End => session.seek(i64::MAX),
            KeyCode::Up => {
                let wpm = i64::from(session.wpm()) + wpm_step;
                session.set_speed(wpm);
            }
            KeyCode::Down => {
                let wpm = i64::from(session.wpm()) - wpm_step;
                session.set_speed(wpm);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let scale = session.font_scale() + zoom_step;
                session.set_zoom(scale);
            }
            KeyCode::Char('-') => {
                let scale = session.font_scale() - zoom_step;
                session.set_zoom(scale);
            }
            KeyCode::Char('e') => {
                session.suspend();
                self.mode = Mode::Editing;
                self.sidebar_open = true;
            }
            KeyCode::Char('s') => self.sidebar_open = !self.sidebar_open,
            KeyCode::Char('t') => {
                self.library.add_document();
            }
            KeyCode::Char('x') => {
                let id = self.library.active_id().clone();
                self.library.close_document(&id);
            }
            KeyCode::Tab => self.library.activate_next(),
            KeyCode::BackTab => self.library.activate_previous(),
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        let mut text = self.library.active_session().raw_text().to_string();
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Reading;
                return;
            }
            KeyCode::Char(c) => text.push(c),
            KeyCode::Enter => text.push('\n'),
            KeyCode::Tab => text.push('\t'),
            KeyCode::Backspace => {
                if text.pop().is_none() {
                    return;
                }
            }
            _ => return,
        }
        self.library.set_active_text(&text);
    }

    /// Fires due playback ticks; true when the screen needs redrawing.
    pub fn on_tick(&mut self) -> bool {
        !matches!(self.library.poll(), Tick::Idle)
    }

    pub fn autosave(&mut self) {
        match self.library.save() {
            Ok(true) => debug!("documents saved"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "failed to save documents"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        // Logging is best effort; the reader works without it
        let _ = logging::init(&log_path, cli.log_level.as_deref());
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);
    info!(profile = %config.profile, wpm = config.wpm, "config loaded");

    let store: Box<dyn DocumentStore> = if cli.fresh {
        Box::new(MemoryDocumentStore::new())
    } else {
        Box::new(FileDocumentStore::new())
    };
    let mut library = Library::open(store, &config).context("failed to load saved documents")?;

    for path in &cli.files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        library.add_document_with(name, &text);
    }
    if let Some(prompt) = &cli.prompt {
        let name = format!("Article {}", library.documents().len() + 1);
        library.add_document_with(name, prompt);
    }
    info!(documents = library.documents().len(), "starting reader");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(library, config);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    shutdown(&mut app, &config_store);
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut last_save = Instant::now();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step(app.library.next_deadline()) {
            ReaderEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            ReaderEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            ReaderEvent::Key(key) => {
                if app.handle_key(key) == KeyOutcome::Quit {
                    break;
                }
                // a key may land exactly on a due tick
                app.on_tick();
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }

        if last_save.elapsed() >= AUTOSAVE_INTERVAL {
            app.autosave();
            last_save = Instant::now();
        }
    }

    Ok(())
}

/// Persist documents, and any speed/zoom adjusted during the run, on the way out
fn shutdown(app: &mut App, config_store: &impl ConfigStore) {
    app.autosave();

    let mut saved = config_store.load();
    if remember_adjustments(&mut saved, &app.config, app.library.active_session()) {
        if let Err(e) = config_store.save(&saved) {
            warn!(error = %e, "failed to save config");
        }
    }
    info!("reader closed");
}

/// Copies speed and zoom into `saved` where the session moved away from
/// what the run started with. Command line overrides alone are not kept.
fn remember_adjustments(saved: &mut Config, started: &Config, session: &Session) -> bool {
    let mut changed = false;
    if session.wpm() != started.initial_wpm() {
        saved.wpm = session.wpm();
        changed = true;
    }
    if session.font_scale() != started.initial_font_scale() {
        saved.font_scale = session.font_scale();
        changed = true;
    }
    changed
}
