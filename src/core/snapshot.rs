//! Deterministic snapshot generation
//!
//! A snapshot is an owned, read-only copy of everything a renderer needs:
//! the cell grid, cursor position and visibility, input modes, title, and
//! the generation counter of the session it came from. Given the same byte stream, the
//! terminal must produce identical snapshots.

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::screen::Screen;

/// A complete snapshot of the visible terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Screen dimensions
    pub cols: usize,
    pub rows: usize,
    /// Visible grid content (row-major, each row exactly `cols` cells)
    pub lines: Vec<Vec<Cell>>,
    /// Cursor state
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub cursor_visible: bool,
    /// Input modes the keyboard side must follow (DECCKM, bracketed paste)
    pub application_cursor_keys: bool,
    pub bracketed_paste: bool,
    /// Window title
    pub title: String,
    /// Increases on every state change of the owning session
    pub generation: u64,
}

impl Snapshot {
    /// Create a snapshot from the current screen state
    pub fn from_screen(screen: &Screen, generation: u64) -> Self {
        Snapshot {
            cols: screen.cols(),
            rows: screen.rows(),
            lines: screen.grid().iter().map(|row| row.cells.clone()).collect(),
            cursor_row: screen.cursor().row,
            cursor_col: screen.cursor().col,
            cursor_visible: screen.modes().cursor_visible,
            application_cursor_keys: screen.modes().application_cursor_keys,
            bracketed_paste: screen.modes().bracketed_paste,
            title: screen.title().to_string(),
            generation,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.lines.get(row).and_then(|line| line.get(col))
    }

    /// Text of one row, continuation cells skipped, trailing blanks trimmed
    pub fn row_text(&self, row: usize) -> String {
        let Some(line) = self.lines.get(row) else {
            return String::new();
        };
        let text: String = line
            .iter()
            .filter(|cell| !cell.is_wide_continuation())
            .map(|cell| cell.c)
            .collect();
        text.trim_end().to_string()
    }

    /// Get a simple text representation of the screen (for debugging)
    pub fn to_text(&self) -> String {
        let mut result = String::new();
        for row in 0..self.rows {
            result.push_str(&self.row_text(row));
            result.push('\n');
        }

        // Remove trailing empty lines
        while result.ends_with("\n\n") {
            result.pop();
        }

        result
    }

    /// Convert snapshot to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compare grid content and cursor, ignoring title and generation
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.cols == other.cols
            && self.rows == other.rows
            && self.lines == other.lines
            && self.cursor_row == other.cursor_row
            && self.cursor_col == other.cursor_col
    }
}
