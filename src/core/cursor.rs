//! Cursor state management
//!
//! The cursor tracks the write position. It also supports save/restore
//! operations (DECSC/DECRC and CSI s/u). Every movement clamps to the grid,
//! so the position is always a valid cell.

use serde::{Deserialize, Serialize};

use super::cell::Attributes;

/// Cursor position (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Row position
    pub row: usize,
    /// Column position
    pub col: usize,
}

/// Saved cursor state for DECSC/DECRC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursor {
    pub row: usize,
    pub col: usize,
    pub attrs: Attributes,
}

impl Cursor {
    /// Create a new cursor at the home position
    pub fn new() -> Self {
        Self::default()
    }

    /// Move cursor to absolute position, clamping to bounds
    pub fn move_to(&mut self, row: usize, col: usize, rows: usize, cols: usize) {
        self.row = row.min(rows.saturating_sub(1));
        self.col = col.min(cols.saturating_sub(1));
    }

    /// Move cursor up by n rows, stopping at row 0
    pub fn move_up(&mut self, n: usize) {
        self.row = self.row.saturating_sub(n);
    }

    /// Move cursor down by n rows, stopping at the last row
    pub fn move_down(&mut self, n: usize, rows: usize) {
        self.row = self.row.saturating_add(n).min(rows.saturating_sub(1));
    }

    /// Move cursor left by n columns, stopping at column 0
    pub fn move_left(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
    }

    /// Move cursor right by n columns, stopping at the last column
    pub fn move_right(&mut self, n: usize, cols: usize) {
        self.col = self.col.saturating_add(n).min(cols.saturating_sub(1));
    }

    /// Carriage return - move to column 0
    pub fn carriage_return(&mut self) {
        self.col = 0;
    }

    /// Pull the cursor back inside a (possibly shrunk) grid
    pub fn clamp(&mut self, rows: usize, cols: usize) {
        self.move_to(self.row, self.col, rows, cols);
    }

    /// Capture position and pen
    pub fn save(&self, attrs: Attributes) -> SavedCursor {
        SavedCursor {
            row: self.row,
            col: self.col,
            attrs,
        }
    }

    /// Restore a saved position, clamped to the current grid
    pub fn restore(&mut self, saved: &SavedCursor, rows: usize, cols: usize) {
        self.move_to(saved.row, saved.col, rows, cols);
    }
}

impl SavedCursor {
    /// Clamp the saved position after a resize
    pub fn clamp(&mut self, rows: usize, cols: usize) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.col = self.col.min(cols.saturating_sub(1));
    }
}
