//! Terminal Core Module
//!
//! Platform-independent terminal state management. This module contains:
//! - Cell representation with attributes
//! - Cursor state and positioning
//! - The cell grid
//! - The screen interpreter that applies parser operations
//! - Deterministic snapshot generation
//!
//! The core is designed to be completely deterministic: given the same
//! sequence of terminal operations, it will always produce the same state.

mod cell;
mod cursor;
mod grid;
mod screen;
mod snapshot;

pub use cell::{Attributes, Cell, Color, Style};
pub use cursor::{Cursor, SavedCursor};
pub use grid::{Grid, Row};
pub use screen::{Modes, Screen, DEFAULT_TAB_WIDTH};
pub use snapshot::Snapshot;
