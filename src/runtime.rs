use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::clock::{Clock, SystemClock};
use crate::engine::{InputOutcome, SessionEngine};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait SessionEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(SessionEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(SessionEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests and headless drivers
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl SessionEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Input and ticks come out of one channel on one thread, so engine
/// mutations never interleave. A tick is due once a full interval has
/// passed since the last one, however busy the input is.
pub struct Runner<E: SessionEventSource, T: Ticker, C: Clock = SystemClock> {
    event_source: E,
    ticker: T,
    clock: C,
    last_tick_ms: Cell<u64>,
}

impl<E: SessionEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self::with_clock(event_source, ticker, SystemClock::new())
    }
}

impl<E: SessionEventSource, T: Ticker, C: Clock> Runner<E, T, C> {
    pub fn with_clock(event_source: E, ticker: T, clock: C) -> Self {
        let last_tick_ms = Cell::new(clock.now_ms());
        Self {
            event_source,
            ticker,
            clock,
            last_tick_ms,
        }
    }

    /// Returns Tick if one is due, otherwise blocks until the next event or the tick deadline
    pub fn step(&self) -> SessionEvent {
        let since_tick = self.clock.now_ms().saturating_sub(self.last_tick_ms.get());
        let wait = self
            .ticker
            .interval()
            .saturating_sub(Duration::from_millis(since_tick));
        if wait.is_zero() {
            return self.tick();
        }

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => self.tick(),
        }
    }

    fn tick(&self) -> SessionEvent {
        self.last_tick_ms.set(self.clock.now_ms());
        SessionEvent::Tick
    }
}

/// What a key press asks of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Char(char),
    Delete,
    Reset,
    Retry,
    Quit,
    Noop,
}

impl Command {
    pub fn from_key(key: &KeyEvent) -> Self {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Command::Quit,
                KeyCode::Char('r') => Command::Retry,
                _ => Command::Noop,
            };
        }
        match key.code {
            KeyCode::Esc => Command::Quit,
            KeyCode::Tab => Command::Reset,
            KeyCode::Backspace => Command::Delete,
            KeyCode::Enter => Command::Char('\n'),
            KeyCode::Char(c) => Command::Char(c),
            _ => Command::Noop,
        }
    }

    /// Feed typing commands to the engine. Session-level commands are left to the caller.
    pub fn apply<C: Clock>(self, engine: &mut SessionEngine<C>) -> InputOutcome {
        match self {
            Command::Char(c) => engine.handle_char(c),
            Command::Delete => engine.character_deleted(),
            Command::Reset => {
                engine.reset();
                InputOutcome::Applied
            }
            Command::Retry => {
                engine.retry();
                InputOutcome::Applied
            }
            Command::Quit | Command::Noop => InputOutcome::Ignored,
        }
    }
}
