mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use lokitype::{
    config::{Config, ConfigStore, FileConfigStore, TIME_LIMITS},
    logging,
    runtime::{Command, CrosstermEventSource, FixedTicker, Runner, SessionEvent},
    Mode, SessionConfig, SessionEngine, SessionState, VocabularyKind,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// typing speed test with fixed-length and timed sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a stream of words or sentences and watch your speed and accuracy live. Fixed sessions end on the last token, timed sessions end when the clock runs out."
)]
pub struct Cli {
    /// session mode (defaults to the last one used)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// draw tokens from single words or whole sentences
    #[clap(short = 'v', long, value_enum)]
    vocabulary: Option<VocabularyKind>,

    /// number of tokens in a fixed session, or per batch in a timed one
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// number of seconds to run a timed test (15, 30, 60 or 120); implies --mode timed
    #[clap(short = 's', long)]
    number_of_secs: Option<u64>,

    /// custom prompt to type instead of sampled tokens
    #[clap(short = 'p', long)]
    prompt: Option<String>,
}

impl Cli {
    /// Stored preferences overridden by whatever was given on the command line.
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.number_of_secs {
            cfg.time_limit_secs = secs;
            cfg.mode = Mode::Timed;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(vocabulary) = self.vocabulary {
            cfg.vocabulary = vocabulary;
        }
        if let Some(n) = self.number_of_words {
            cfg.token_count = n;
        }
        cfg
    }
}

/// Split a custom prompt into tokens: whitespace-separated words, or one sentence.
fn prompt_tokens(prompt: &str, vocabulary: VocabularyKind) -> Vec<String> {
    match vocabulary {
        VocabularyKind::Words => prompt.split_whitespace().map(str::to_string).collect(),
        VocabularyKind::Sentences => {
            let sentence = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
            if sentence.is_empty() {
                Vec::new()
            } else {
                vec![sentence]
            }
        }
    }
}

pub struct App {
    pub engine: SessionEngine,
    pub prompt: Option<Vec<String>>,
}

impl App {
    pub fn new(config: SessionConfig, prompt: Option<&str>) -> lokitype::error::Result<Self> {
        let mut engine = SessionEngine::new(config)?;
        let prompt = prompt.map(|p| prompt_tokens(p, config.vocabulary));
        if let Some(tokens) = &prompt {
            engine.reset_with_tokens(tokens.clone())?;
        }
        Ok(Self { engine, prompt })
    }

    fn new_session(&mut self) {
        match &self.prompt {
            Some(tokens) => {
                if let Err(e) = self.engine.reset_with_tokens(tokens.clone()) {
                    tracing::warn!(error = %e, "custom prompt rejected, sampling instead");
                    self.engine.reset();
                }
            }
            None => self.engine.reset(),
        }
    }

    fn cycle_time_limit(&mut self, forward: bool) {
        let current = self.engine.config().time_limit_secs;
        let idx = TIME_LIMITS.iter().position(|&s| s == current).unwrap_or(0);
        let next = if forward {
            (idx + 1) % TIME_LIMITS.len()
        } else {
            (idx + TIME_LIMITS.len() - 1) % TIME_LIMITS.len()
        };
        if let Err(e) = self.engine.time_limit_changed(TIME_LIMITS[next]) {
            tracing::warn!(error = %e, "time limit change rejected");
        }
    }

    /// Returns false when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        let state = self.engine.state();

        if self.engine.config().is_timed() && state == SessionState::Idle {
            match key.code {
                KeyCode::Left => {
                    self.cycle_time_limit(false);
                    return true;
                }
                KeyCode::Right => {
                    self.cycle_time_limit(true);
                    return true;
                }
                _ => {}
            }
        }

        match Command::from_key(&key) {
            Command::Quit => return false,
            Command::Char('r') if state == SessionState::Finished => self.engine.retry(),
            Command::Char('n') if state == SessionState::Finished => self.new_session(),
            Command::Reset => self.new_session(),
            command => {
                command.apply(&mut self.engine);
            }
        }
        true
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = logging::init() {
        eprintln!("logging disabled: {e}");
    }

    let store = FileConfigStore::new();
    let config = cli.merge_into(store.load());
    let session_config = SessionConfig::from(&config);

    let mut app = match App::new(session_config, cli.prompt.as_deref()) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&Config::from(*app.engine.config())) {
        tracing::warn!(error = %e, "failed to save config");
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            SessionEvent::Tick => {
                app.engine.on_tick();
            }
            SessionEvent::Resize => {}
            SessionEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
