//! Terminal Grid
//!
//! A 2D grid of cells representing the visible terminal area. Every row
//! always holds exactly `cols` cells and the grid always holds exactly
//! `rows` rows; scrolling rotates rows in place and blanks the exposed ones.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, Color};

/// A row of cells in the terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// The cells in this row
    pub cells: Vec<Cell>,
    /// Whether the cursor auto-wrapped off the end of this row
    pub wrapped: bool,
}

impl Row {
    pub fn new(cols: usize) -> Self {
        Self {
            cells: vec![Cell::default(); cols],
            wrapped: false,
        }
    }

    /// Truncate or pad with default cells, left-anchored
    pub fn resize(&mut self, cols: usize) {
        self.cells.resize(cols, Cell::default());
        // A wide glyph cut in half by truncation has no room left
        if let Some(last) = self.cells.last_mut() {
            if last.width == 2 {
                last.erase(last.bg);
            }
        }
    }

    pub fn erase(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.erase(bg);
        }
        self.wrapped = false;
    }

    /// Erase cells in `start..end`, clamped to the row
    pub fn erase_range(&mut self, start: usize, end: usize, bg: Color) {
        let end = end.min(self.cells.len());
        if start >= end {
            return;
        }
        for cell in &mut self.cells[start..end] {
            cell.erase(bg);
        }
    }

    /// Shift cells at and after `at` right by `n`, filling the gap with blanks
    pub fn insert_blanks(&mut self, at: usize, n: usize, bg: Color) {
        let len = self.cells.len();
        if at >= len {
            return;
        }
        let n = n.min(len - at);
        self.cells[at..].rotate_right(n);
        self.erase_range(at, at + n, bg);
    }

    /// Remove `n` cells at `at`, shifting the rest left and blanking the tail
    pub fn delete_cells(&mut self, at: usize, n: usize, bg: Color) {
        let len = self.cells.len();
        if at >= len {
            return;
        }
        let n = n.min(len - at);
        self.cells[at..].rotate_left(n);
        self.erase_range(len - n, len, bg);
    }

    /// The row's characters with trailing blanks trimmed
    pub fn text(&self) -> String {
        let s: String = self
            .cells
            .iter()
            .filter(|c| !c.is_wide_continuation())
            .map(|c| c.c)
            .collect();
        s.trim_end().to_string()
    }
}

/// The terminal grid - a 2D array of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// The rows in the grid
    rows: Vec<Row>,
    /// Number of columns
    cols: usize,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
            cols,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Get a reference to a cell
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Get a mutable reference to a cell
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col))
    }

    /// Get a reference to a row
    pub fn row(&self, row: usize) -> Option<&Row> {
        self.rows.get(row)
    }

    /// Get a mutable reference to a row
    pub fn row_mut(&mut self, row: usize) -> Option<&mut Row> {
        self.rows.get_mut(row)
    }

    /// Iterate over all rows, top to bottom
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Resize the grid: rows are kept left-anchored, columns truncated or
    /// padded, and rows truncated or padded at the bottom.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        for row in &mut self.rows {
            row.resize(cols);
        }
        self.rows.resize_with(rows, || Row::new(cols));
        self.cols = cols;
    }

    /// Erase the entire grid with a background color
    pub fn erase(&mut self, bg: Color) {
        for row in &mut self.rows {
            row.erase(bg);
        }
    }

    /// Scroll rows `top..=bottom` up by n: the top n rows are dropped and
    /// blank rows appear at the bottom of the region.
    pub fn scroll_up(&mut self, top: usize, bottom: usize, n: usize, bg: Color) {
        let Some(region) = self.region_mut(top, bottom) else {
            return;
        };
        let n = n.min(region.len());
        region.rotate_left(n);
        let len = region.len();
        for row in &mut region[len - n..] {
            row.erase(bg);
        }
    }

    /// Scroll rows `top..=bottom` down by n: blank rows appear at the top of
    /// the region and the bottom n rows are dropped.
    pub fn scroll_down(&mut self, top: usize, bottom: usize, n: usize, bg: Color) {
        let Some(region) = self.region_mut(top, bottom) else {
            return;
        };
        let n = n.min(region.len());
        region.rotate_right(n);
        for row in &mut region[..n] {
            row.erase(bg);
        }
    }

    fn region_mut(&mut self, top: usize, bottom: usize) -> Option<&mut [Row]> {
        if top > bottom || bottom >= self.rows.len() {
            return None;
        }
        Some(&mut self.rows[top..=bottom])
    }
}
