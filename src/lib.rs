//! tinyterm: a terminal emulator core
//!
//! Turns the byte stream a child process writes into a grid of styled cells,
//! and turns key presses back into the bytes the child expects.
//!
//! - `core`: cells, cursor, grid, the screen interpreter, snapshots
//! - `parser`: VT/xterm escape sequence parser
//! - `input`: key and paste encoding
//! - `session`: the terminal session tying parser and screen together
//! - `host`: runs a session against a live child on a reader thread
//! - `pty`: Unix PTY management
//! - `renderer`: renderer interface and an ANSI text renderer
//! - `config`: JSON configuration

pub mod config;
pub mod core;
pub mod host;
pub mod input;
pub mod parser;
#[cfg(unix)]
pub mod pty;
pub mod renderer;
pub mod session;

pub use config::{Config, ConfigError};
pub use core::{Cell, Color, Snapshot};
pub use host::{BlockingReader, ChildOutput, SessionHost};
pub use input::{BackspaceMode, InputConfig, Key, KeyEvent, Modifiers};
pub use parser::{Operation, Parser};
pub use renderer::{AnsiRenderer, Renderer};
pub use session::{Session, SessionError, SessionEvent};
