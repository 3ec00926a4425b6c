mod ui;

use std::{
    io::{self, stdin},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use recite::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    feedback::{Announcer, SilentAnnouncer, TerminalBell},
    keyboard::KeyboardSpeechStream,
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scheduler::SystemClock,
    script::DialogScript,
    session::SessionConfig,
    Rehearsal,
};

const DEFAULT_SCRIPT: &str = "cafe";

/// spoken dialogue practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice scripted dialogues line by line. Each line is scored word by word as you speak it; pass a line to move on and see your accuracy at the end."
)]
pub struct Cli {
    /// path to a dialogue script (JSON)
    #[clap(short = 's', long, conflicts_with = "bundled")]
    script: Option<PathBuf>,

    /// name of a bundled dialogue script
    #[clap(short = 'b', long)]
    bundled: Option<String>,

    /// recognition language tag
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// percentage of words that must be matched for a line to pass
    #[clap(long)]
    pass_threshold: Option<f64>,

    /// seconds of silence before an attempt is scored
    #[clap(long)]
    inactivity_secs: Option<u64>,

    /// disable the success / retry bell
    #[clap(long)]
    no_feedback: bool,

    /// list bundled dialogue scripts and exit
    #[clap(long)]
    list: bool,

    /// print the session summary as JSON on exit
    #[clap(long)]
    summary_json: bool,
}

impl Cli {
    /// Stored preferences with command line overrides applied
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(threshold) = self.pass_threshold {
            config.pass_threshold = threshold;
        }
        if let Some(secs) = self.inactivity_secs {
            config.inactivity_timeout_secs = secs;
        }
        if self.no_feedback {
            config.feedback_sounds = false;
        }
        if let Some(name) = &self.bundled {
            config.last_script = Some(name.clone());
        }
        config
    }

    fn load_script(&self, config: &Config) -> Result<DialogScript> {
        if let Some(path) = &self.script {
            return DialogScript::from_path(path)
                .with_context(|| format!("loading script {}", path.display()));
        }
        let name = config.last_script.as_deref().unwrap_or(DEFAULT_SCRIPT);
        DialogScript::bundled(name).with_context(|| format!("loading bundled script '{name}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Practice,
    Results,
}

pub struct App {
    pub rehearsal: Rehearsal<KeyboardSpeechStream, Box<dyn Announcer>>,
    pub state: AppState,
}

impl App {
    pub fn new(script: DialogScript, config: &Config) -> Self {
        let announcer: Box<dyn Announcer> = if config.feedback_sounds {
            Box::new(TerminalBell)
        } else {
            Box::new(SilentAnnouncer)
        };
        let title = script.title.clone();
        let session_config = SessionConfig::from(config);
        let rehearsal = Rehearsal::with_clock(
            script.into_lines(),
            KeyboardSpeechStream::new(),
            announcer,
            SystemClock,
            session_config,
        )
        .with_title(title);

        Self {
            rehearsal,
            state: AppState::Practice,
        }
    }

    pub fn on_tick(&mut self) {
        self.rehearsal.on_tick();
        if self.rehearsal.is_game_over() {
            self.state = AppState::Results;
        }
    }

    /// Returns false when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return false;
        }

        match self.state {
            AppState::Practice => self.on_practice_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('q') => return false,
                KeyCode::Char('r') => {
                    self.rehearsal.replay();
                    self.state = AppState::Practice;
                }
                _ => {}
            },
        }

        self.on_tick();
        true
    }

    fn on_practice_key(&mut self, key: KeyEvent) {
        let listening = self.rehearsal.is_listening();
        match key.code {
            KeyCode::Tab if listening => self.rehearsal.stop_listening(),
            KeyCode::Tab => self.rehearsal.start_listening(),
            KeyCode::Enter if listening => self.rehearsal.speech_mut().commit(),
            KeyCode::Enter => self.rehearsal.start_listening(),
            KeyCode::Backspace if listening => self.rehearsal.speech_mut().backspace(),
            KeyCode::Char(c) if listening => self.rehearsal.speech_mut().type_char(c),
            KeyCode::Right => self.rehearsal.move_to_next_line(),
            KeyCode::Left => {
                let index = self.rehearsal.current_line_index();
                self.rehearsal
                    .set_current_line_index(index.saturating_sub(1));
            }
            KeyCode::Home => self.rehearsal.set_current_line_index(0),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for name in DialogScript::bundled_names() {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path);
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    let script = match cli.load_script(&config) {
        Ok(script) => script,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("{err:#}")).exit();
        }
    };
    if let Err(err) = store.save(&config) {
        tracing::warn!(%err, "unable to save config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(script, &config);
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let summary = app.rehearsal.summary();
    app.rehearsal.teardown();
    outcome?;

    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
