//! Terminal Session
//!
//! Ties together the parser and the screen interpreter. The session is the
//! only mutator of screen state: child output goes in through [`Session::feed`],
//! renderers read owned [`Snapshot`]s, and key events come back out as bytes
//! through [`Session::encode_key`].

use crate::config::Config;
use crate::core::{Screen, Snapshot};
use crate::input::{self, BackspaceMode, InputConfig, KeyEvent};
use crate::parser::{Operation, Parser};

/// Something the embedding application may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// BEL received
    Bell,
    /// OSC 0/2 set a new title
    TitleChanged(String),
    /// The child process finished; exit code when known
    Exited(Option<i32>),
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot resize to {cols}x{rows}: dimensions must be at least 1x1")]
    ResizeToZero { cols: usize, rows: usize },

    #[error("Child process has exited")]
    ChildExited,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A terminal session: screen state plus the parser feeding it
#[derive(Debug)]
pub struct Session {
    screen: Screen,
    parser: Parser,
    backspace: BackspaceMode,
    events: Vec<SessionEvent>,
    generation: u64,
}

impl Session {
    /// Create a session with the given dimensions. Zero dimensions are
    /// raised to 1.
    pub fn new(cols: usize, rows: usize) -> Self {
        if cols == 0 || rows == 0 {
            tracing::warn!("Session size {}x{} raised to at least 1x1", cols, rows);
        }
        Self::from_screen(Screen::new(cols, rows), BackspaceMode::default())
    }

    /// Create a session from configuration
    pub fn with_config(config: &Config) -> Self {
        let (cols, rows) = (usize::from(config.columns), usize::from(config.rows));
        if cols == 0 || rows == 0 {
            tracing::warn!("Configured size {}x{} raised to at least 1x1", cols, rows);
        }
        let screen = Screen::with_tab_width(cols, rows, config.tab_width);
        Self::from_screen(screen, config.backspace)
    }

    fn from_screen(screen: Screen, backspace: BackspaceMode) -> Self {
        Self {
            screen,
            parser: Parser::new(),
            backspace,
            events: Vec::new(),
            generation: 0,
        }
    }

    /// Read access to the screen
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn cols(&self) -> usize {
        self.screen.cols()
    }

    pub fn rows(&self) -> usize {
        self.screen.rows()
    }

    /// Counter that increases on every state change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Process output bytes from the child. Sequences split across calls are
    /// completed by later calls.
    pub fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        for op in self.parser.parse(bytes) {
            self.apply(op);
        }
        self.generation += 1;
    }

    fn apply(&mut self, op: Operation) {
        match &op {
            Operation::Bell => self.events.push(SessionEvent::Bell),
            Operation::SetTitle(title) if title != self.screen.title() => {
                self.events.push(SessionEvent::TitleChanged(title.clone()));
            }
            _ => {}
        }
        self.screen.apply(op);
    }

    /// Resize the session. Zero dimensions are rejected and leave the state
    /// untouched.
    pub fn resize(&mut self, cols: usize, rows: usize) -> Result<(), SessionError> {
        if cols == 0 || rows == 0 {
            tracing::warn!("Rejected resize to {}x{}", cols, rows);
            return Err(SessionError::ResizeToZero { cols, rows });
        }
        if cols != self.cols() || rows != self.rows() {
            self.screen.resize(cols, rows);
            self.generation += 1;
        }
        Ok(())
    }

    /// Owned copy of the visible state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_screen(&self.screen, self.generation)
    }

    /// Encoder settings derived from the current modes
    pub fn input_config(&self) -> InputConfig {
        InputConfig {
            application_cursor_keys: self.screen.modes().application_cursor_keys,
            backspace: self.backspace,
        }
    }

    /// Bytes to send to the child for a key press
    pub fn encode_key(&self, event: &KeyEvent) -> Vec<u8> {
        input::encode_key(event, &self.input_config())
    }

    /// Bytes to send to the child for pasted text
    pub fn encode_paste(&self, text: &str) -> Vec<u8> {
        input::encode_paste(text, self.screen.modes().bracketed_paste)
    }

    /// Record that the child process has finished
    pub fn record_exit(&mut self, code: Option<i32>) {
        tracing::info!("Child exited with status {:?}", code);
        self.events.push(SessionEvent::Exited(code));
        self.generation += 1;
    }

    /// Drain pending events
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain replies owed to the child (device status reports)
    pub fn take_responses(&mut self) -> Vec<u8> {
        self.screen.take_responses()
    }
}
