pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::Show,
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keytap::{
    app_dirs::AppDirs,
    config::Tab,
    runtime::{key_name, session_key, AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{Phase, SessionEvent},
    storage::{JsonFileStore, KeyValueStore},
    text_generator::{ContentType, Difficulty},
    typing_test::{Control, TypingTest},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

/// keyboard echo and typing speed test in your terminal
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A keyboard tester and timed typing test with difficulty levels, code and quote passages, and a persistent history of your last ten results."
)]
pub struct Cli {
    /// seconds per typing test (stored as the new default)
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// passage difficulty (stored as the new default)
    #[clap(short = 'l', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// passage content (stored as the new default)
    #[clap(short = 'c', long, value_enum)]
    content: Option<ContentType>,

    /// do not colour typed characters as correct or incorrect
    #[clap(long)]
    hide_errors: bool,

    /// path of the JSON settings and history store
    #[clap(long)]
    store: Option<PathBuf>,

    /// path of the log file
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags given on the command line, as the settings controls they stand for
    fn overrides(&self) -> Vec<Control> {
        let mut controls = vec![];
        if let Some(secs) = self.duration {
            controls.push(Control::SetDuration(secs));
        }
        if let Some(difficulty) = self.difficulty {
            controls.push(Control::SetDifficulty(difficulty));
        }
        if let Some(content) = self.content {
            controls.push(Control::SetContentType(content));
        }
        if self.hide_errors {
            controls.push(Control::SetShowErrors(false));
        }
        controls
    }
}

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A countdown began; restart the tick schedule so its first second is whole.
    Resync,
    Quit,
}

#[derive(Debug)]
pub struct App<S: KeyValueStore = JsonFileStore> {
    pub test: TypingTest<S>,
    pub tab: Tab,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(mut test: TypingTest<S>, cli: &Cli) -> Self {
        for control in cli.overrides() {
            test.on_control(control);
        }
        if test.session().is_empty() {
            test.on_control(Control::NewText);
        }
        let tab = test.settings().active_tab;
        Self { test, tab }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.test.select_tab(tab);
    }

    pub fn on_tick(&mut self) {
        self.test.on_tick();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if key.code == KeyCode::Tab && !self.typing_in_progress() {
            self.select_tab(self.tab.next());
            return Flow::Continue;
        }

        match self.tab {
            Tab::KeyTest => self.key_test_key(key),
            Tab::TypingTest => self.typing_key(key),
            Tab::Settings => self.settings_key(key),
        }
    }

    /// The Typing tab is held from the countdown until the run ends.
    fn typing_in_progress(&self) -> bool {
        self.tab == Tab::TypingTest && self.test.is_running()
    }

    fn key_test_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            self.test.clear_key_display();
        } else {
            self.test.record_key(&key_name(&key));
        }
        Flow::Continue
    }

    fn typing_key(&mut self, key: KeyEvent) -> Flow {
        match self.test.session().phase() {
            Phase::Active => {
                self.test.on_key(session_key(&key));
                Flow::Continue
            }
            Phase::Countdown => {
                if key.code == KeyCode::Esc {
                    self.test.on_control(Control::NewText);
                }
                Flow::Continue
            }
            Phase::Idle | Phase::Finished => {
                let settings = self.test.settings().clone();
                let control = match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') => Control::Start,
                    KeyCode::Char('r') => Control::Retry,
                    KeyCode::Char('n') => Control::NewText,
                    KeyCode::Char('d') => Control::SetDifficulty(settings.difficulty.next()),
                    KeyCode::Char('c') => Control::SetContentType(settings.content_type.next()),
                    KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                    _ => return Flow::Continue,
                };
                self.control(control)
            }
        }
    }

    fn settings_key(&mut self, key: KeyEvent) -> Flow {
        let settings = self.test.settings().clone();
        let control = match key.code {
            KeyCode::Char('t') => Control::SetDuration(settings.next_duration()),
            KeyCode::Char('d') => Control::SetDifficulty(settings.difficulty.next()),
            KeyCode::Char('c') => Control::SetContentType(settings.content_type.next()),
            KeyCode::Char('e') => Control::SetShowErrors(!settings.show_errors),
            KeyCode::Char('h') => Control::ClearHistory,
            KeyCode::Char('X') => Control::ResetAllData,
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            _ => return Flow::Continue,
        };
        self.control(control)
    }

    fn control(&mut self, control: Control) -> Flow {
        let events = self.test.on_control(control);
        if control == Control::ResetAllData {
            self.tab = self.test.settings().active_tab;
        }
        if events
            .iter()
            .any(|e| matches!(e, SessionEvent::Countdown(_)))
        {
            Flow::Resync
        } else {
            Flow::Continue
        }
    }
}

fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("logging disabled: {}", e);
            return;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("logging disabled: {}: {}", path.display(), e);
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
    {
        eprintln!("logging disabled: {}", e);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli.log_file.clone().unwrap_or_else(AppDirs::log_path));

    let store = JsonFileStore::open(cli.store.clone().unwrap_or_else(AppDirs::store_path));
    tracing::info!("using store {}", store.path().display());
    let mut app = App::new(TypingTest::new(store)?, &cli);

    enable_raw_mode()?;
    run_then_restore(
        || {
            execute!(io::stdout(), EnterAlternateScreen)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
            start_tui(&mut terminal, &mut app)
        },
        || {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, Show)
        },
    )
}

/// Runs `body`, then `restore` whether or not `body` failed.
fn run_then_restore<T>(
    body: impl FnOnce() -> Result<T, Box<dyn Error>>,
    restore: impl FnOnce() -> io::Result<()>,
) -> Result<T, Box<dyn Error>> {
    let outcome = body();
    let restored = restore();
    let value = outcome?;
    restored?;
    Ok(value)
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => match app.handle_key(key) {
                Flow::Continue => {}
                Flow::Resync => runner.resync(),
                Flow::Quit => break,
            },
        }
    }

    tracing::info!("quitting");
    Ok(())
}
