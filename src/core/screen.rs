//! Screen model implementation
//!
//! The screen is the interpreter: it owns the grid, cursor, pen, scroll
//! region, tab stops and mode flags, and applies parser operations to them.
//! Applying an operation never performs I/O. Replies the terminal owes the
//! child (DSR, DA) are queued in a response buffer instead.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use super::cell::{Attributes, Cell};
use super::cursor::{Cursor, SavedCursor};
use super::grid::{Grid, Row};
use crate::parser::{Attribute, CursorMove, EraseMode, Mode, Operation, TabClear};

/// Default distance between tab stops
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Terminal mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    /// Application cursor keys (DECCKM)
    pub application_cursor_keys: bool,
    /// Auto-wrap at the right margin (DECAWM)
    pub autowrap: bool,
    /// Cursor visible (DECTCEM)
    pub cursor_visible: bool,
    /// Insert mode (IRM)
    pub insert: bool,
    /// Line feed/new line mode (LNM)
    pub linefeed_newline: bool,
    /// Bracketed paste mode (xterm)
    pub bracketed_paste: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            application_cursor_keys: false,
            autowrap: true,
            cursor_visible: true,
            insert: false,
            linefeed_newline: false,
            bracketed_paste: false,
        }
    }
}

impl Modes {
    fn set(&mut self, mode: Mode, enabled: bool) {
        match mode {
            Mode::Insert => self.insert = enabled,
            Mode::LineFeedNewLine => self.linefeed_newline = enabled,
            Mode::ApplicationCursorKeys => self.application_cursor_keys = enabled,
            Mode::AutoWrap => self.autowrap = enabled,
            Mode::ShowCursor => self.cursor_visible = enabled,
            Mode::BracketedPaste => self.bracketed_paste = enabled,
        }
    }
}

/// The main screen structure
#[derive(Debug, Clone)]
pub struct Screen {
    grid: Grid,
    cursor: Cursor,
    /// Saved cursor (DECSC/DECRC)
    saved_cursor: Option<SavedCursor>,
    /// Pen for newly printed cells
    attrs: Attributes,
    /// Scroll region top (0-indexed, inclusive)
    scroll_top: usize,
    /// Scroll region bottom (0-indexed, inclusive)
    scroll_bottom: usize,
    tab_stops: Vec<bool>,
    tab_width: usize,
    modes: Modes,
    /// Window title (set via OSC 0/2)
    title: String,
    /// Pending replies to the child
    responses: Vec<u8>,
}

impl Screen {
    /// Create a new screen with the given dimensions (each at least 1)
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::with_tab_width(cols, rows, DEFAULT_TAB_WIDTH)
    }

    /// Create a new screen with tab stops every `tab_width` columns
    pub fn with_tab_width(cols: usize, rows: usize, tab_width: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let tab_width = tab_width.max(1);

        Self {
            grid: Grid::new(cols, rows),
            cursor: Cursor::new(),
            saved_cursor: None,
            attrs: Attributes::default(),
            scroll_top: 0,
            scroll_bottom: rows - 1,
            tab_stops: default_tab_stops(cols, tab_width),
            tab_width,
            modes: Modes::default(),
            title: String::new(),
            responses: Vec::new(),
        }
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// The pen applied to printed cells
    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Scroll region as (top, bottom), inclusive
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.grid.cell(row, col)
    }

    /// Text of a row with trailing blanks trimmed
    pub fn row_text(&self, row: usize) -> String {
        self.grid.row(row).map(Row::text).unwrap_or_default()
    }

    /// Drain replies queued for the child process
    pub fn take_responses(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.responses)
    }

    /// Apply a single operation
    pub fn apply(&mut self, op: Operation) {
        match op {
            Operation::Print(c) => self.print_char(c),
            Operation::LineFeed => {
                self.linefeed();
                if self.modes.linefeed_newline {
                    self.carriage_return();
                }
            }
            Operation::CarriageReturn => self.carriage_return(),
            Operation::Backspace => self.cursor.move_left(1),
            Operation::Tab => self.tab(),
            // The session surfaces bells as events
            Operation::Bell => {}
            Operation::Index => self.linefeed(),
            Operation::NextLine => {
                self.linefeed();
                self.carriage_return();
            }
            Operation::ReverseIndex => self.reverse_index(),
            Operation::MoveCursor(movement) => self.move_cursor(movement),
            Operation::SetAttribute(attr) => self.set_attribute(attr),
            Operation::EraseLine(mode) => self.erase_in_line(mode),
            Operation::EraseDisplay(mode) => self.erase_in_display(mode),
            Operation::EraseChars(n) => self.erase_chars(n),
            Operation::InsertChars(n) => self.insert_chars(n),
            Operation::DeleteChars(n) => self.delete_chars(n),
            Operation::InsertLines(n) => self.insert_lines(n),
            Operation::DeleteLines(n) => self.delete_lines(n),
            Operation::ScrollUp(n) => self.scroll_up(n),
            Operation::ScrollDown(n) => self.scroll_down(n),
            Operation::ScrollRegion { top, bottom } => self.set_scroll_region(top, bottom),
            Operation::SaveCursor => self.save_cursor(),
            Operation::RestoreCursor => self.restore_cursor(),
            Operation::SetMode { mode, enabled } => self.modes.set(mode, enabled),
            Operation::SetTabStop => self.set_tab_stop(),
            Operation::ClearTabStop(which) => self.clear_tab_stop(which),
            Operation::SetTitle(title) => self.title = title,
            Operation::DeviceStatus(report) => self.device_status(report),
            Operation::DeviceAttributes => self.responses.extend_from_slice(b"\x1b[?1;2c"),
            Operation::Reset => self.reset(),
            Operation::Unknown(raw) => {
                tracing::debug!("Ignoring unhandled sequence: {:?}", String::from_utf8_lossy(&raw));
            }
        }
    }

    /// Print a character at the current cursor position
    pub fn print_char(&mut self, c: char) {
        let width = c.width().unwrap_or(0);
        let cols = self.cols();

        // Zero-width codepoints have no cell of their own
        if width == 0 || width > cols {
            return;
        }

        if self.cursor.col + width > cols {
            // A wide glyph with one column left
            if !self.modes.autowrap {
                return;
            }
            self.wrap();
        }

        let row = self.cursor.row;
        let col = self.cursor.col;
        let bg = self.attrs.bg;

        if self.modes.insert {
            if let Some(line) = self.grid.row_mut(row) {
                line.insert_blanks(col, width, bg);
            }
        }

        self.split_wide_at(row, col);
        if width == 2 {
            self.split_wide_at(row, col + 1);
        }

        let mut cell = Cell::with_attributes(c, &self.attrs);
        cell.width = width as u8;
        if let Some(target) = self.grid.cell_mut(row, col) {
            *target = cell;
        }
        if width == 2 {
            if let Some(target) = self.grid.cell_mut(row, col + 1) {
                *target = Cell {
                    c: ' ',
                    width: 0,
                    ..cell
                };
            }
        }

        let next = col + width;
        if next < cols {
            self.cursor.col = next;
        } else if self.modes.autowrap {
            self.wrap();
        } else {
            self.cursor.col = cols - 1;
        }
    }

    /// Blank the other half of a wide glyph about to be overwritten
    fn split_wide_at(&mut self, row: usize, col: usize) {
        let Some(cell) = self.grid.cell(row, col).copied() else {
            return;
        };
        let partner = match cell.width {
            0 => col.checked_sub(1),
            2 => Some(col + 1),
            _ => None,
        };
        if let Some(partner) = partner {
            if let Some(other) = self.grid.cell_mut(row, partner) {
                other.erase(other.bg);
            }
        }
    }

    /// Auto-wrap: flag the row and continue at the start of the next one
    fn wrap(&mut self) {
        if let Some(line) = self.grid.row_mut(self.cursor.row) {
            line.wrapped = true;
        }
        self.cursor.col = 0;
        self.linefeed();
    }

    /// Handle linefeed (LF, IND): down one row, scrolling at the bottom margin
    pub fn linefeed(&mut self) {
        if self.cursor.row == self.scroll_bottom {
            self.grid
                .scroll_up(self.scroll_top, self.scroll_bottom, 1, self.attrs.bg);
        } else {
            self.cursor.move_down(1, self.rows());
        }
    }

    /// Handle reverse index (RI) - move cursor up, scroll if at top
    pub fn reverse_index(&mut self) {
        if self.cursor.row == self.scroll_top {
            self.grid
                .scroll_down(self.scroll_top, self.scroll_bottom, 1, self.attrs.bg);
        } else {
            self.cursor.move_up(1);
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor.carriage_return();
    }

    /// Handle horizontal tab (HT)
    pub fn tab(&mut self) {
        let last = self.cols() - 1;
        let next = (self.cursor.col + 1..self.cols())
            .find(|&col| self.tab_stops.get(col).copied().unwrap_or(false))
            .unwrap_or(last);
        self.cursor.col = next;
    }

    fn move_cursor(&mut self, movement: CursorMove) {
        let (rows, cols) = (self.rows(), self.cols());
        match movement {
            CursorMove::Up(n) => self.cursor.move_up(n),
            CursorMove::Down(n) => self.cursor.move_down(n, rows),
            CursorMove::Forward(n) => self.cursor.move_right(n, cols),
            CursorMove::Backward(n) => self.cursor.move_left(n),
            CursorMove::NextLine(n) => {
                self.cursor.move_down(n, rows);
                self.cursor.carriage_return();
            }
            CursorMove::PrevLine(n) => {
                self.cursor.move_up(n);
                self.cursor.carriage_return();
            }
            CursorMove::Column(col) => self.cursor.move_to(self.cursor.row, col, rows, cols),
            CursorMove::Row(row) => self.cursor.move_to(row, self.cursor.col, rows, cols),
            CursorMove::To { row, col } => self.cursor.move_to(row, col, rows, cols),
        }
    }

    fn set_attribute(&mut self, attr: Attribute) {
        let attrs = &mut self.attrs;
        match attr {
            Attribute::Reset => attrs.reset(),
            Attribute::Bold(on) => attrs.style.bold = on,
            Attribute::Faint(on) => attrs.style.faint = on,
            Attribute::Italic(on) => attrs.style.italic = on,
            Attribute::Underline(on) => attrs.style.underline = on,
            Attribute::Blink(on) => attrs.style.blink = on,
            Attribute::Inverse(on) => attrs.style.inverse = on,
            Attribute::Hidden(on) => attrs.style.hidden = on,
            Attribute::Strikethrough(on) => attrs.style.strikethrough = on,
            Attribute::NormalIntensity => {
                attrs.style.bold = false;
                attrs.style.faint = false;
            }
            Attribute::Foreground(color) => attrs.fg = color,
            Attribute::Background(color) => attrs.bg = color,
        }
    }

    /// Erase in line (EL)
    pub fn erase_in_line(&mut self, mode: EraseMode) {
        let (col, bg) = (self.cursor.col, self.attrs.bg);
        let Some(line) = self.grid.row_mut(self.cursor.row) else {
            return;
        };
        match mode {
            EraseMode::ToEnd => line.erase_range(col, usize::MAX, bg),
            EraseMode::ToStart => line.erase_range(0, col + 1, bg),
            EraseMode::All => line.erase(bg),
        }
    }

    /// Erase in display (ED)
    pub fn erase_in_display(&mut self, mode: EraseMode) {
        let (row, bg) = (self.cursor.row, self.attrs.bg);
        match mode {
            EraseMode::ToEnd => {
                self.erase_in_line(EraseMode::ToEnd);
                for r in row + 1..self.rows() {
                    if let Some(line) = self.grid.row_mut(r) {
                        line.erase(bg);
                    }
                }
            }
            EraseMode::ToStart => {
                for r in 0..row {
                    if let Some(line) = self.grid.row_mut(r) {
                        line.erase(bg);
                    }
                }
                self.erase_in_line(EraseMode::ToStart);
            }
            EraseMode::All => self.grid.erase(bg),
        }
    }

    /// Erase characters (ECH)
    pub fn erase_chars(&mut self, n: usize) {
        let (col, bg) = (self.cursor.col, self.attrs.bg);
        if let Some(line) = self.grid.row_mut(self.cursor.row) {
            line.erase_range(col, col.saturating_add(n), bg);
        }
    }

    /// Insert blank characters (ICH)
    pub fn insert_chars(&mut self, n: usize) {
        let (col, bg) = (self.cursor.col, self.attrs.bg);
        if let Some(line) = self.grid.row_mut(self.cursor.row) {
            line.insert_blanks(col, n, bg);
        }
    }

    /// Delete characters (DCH)
    pub fn delete_chars(&mut self, n: usize) {
        let (col, bg) = (self.cursor.col, self.attrs.bg);
        if let Some(line) = self.grid.row_mut(self.cursor.row) {
            line.delete_cells(col, n, bg);
        }
    }

    fn cursor_in_region(&self) -> bool {
        (self.scroll_top..=self.scroll_bottom).contains(&self.cursor.row)
    }

    /// Insert blank lines at the cursor row (IL); no effect outside the region
    pub fn insert_lines(&mut self, n: usize) {
        if !self.cursor_in_region() {
            return;
        }
        self.grid
            .scroll_down(self.cursor.row, self.scroll_bottom, n, self.attrs.bg);
        self.cursor.carriage_return();
    }

    /// Delete lines at the cursor row (DL); no effect outside the region
    pub fn delete_lines(&mut self, n: usize) {
        if !self.cursor_in_region() {
            return;
        }
        self.grid
            .scroll_up(self.cursor.row, self.scroll_bottom, n, self.attrs.bg);
        self.cursor.carriage_return();
    }

    /// Scroll the region up by n lines (SU)
    pub fn scroll_up(&mut self, n: usize) {
        self.grid
            .scroll_up(self.scroll_top, self.scroll_bottom, n, self.attrs.bg);
    }

    /// Scroll the region down by n lines (SD)
    pub fn scroll_down(&mut self, n: usize) {
        self.grid
            .scroll_down(self.scroll_top, self.scroll_bottom, n, self.attrs.bg);
    }

    /// Set scroll region (DECSTBM); an invalid region selects the whole grid
    pub fn set_scroll_region(&mut self, top: usize, bottom: Option<usize>) {
        let last = self.rows() - 1;
        let bottom = bottom.unwrap_or(last);

        if top < bottom && bottom <= last {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = last;
        }

        self.cursor.move_to(0, 0, self.rows(), self.cols());
    }

    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor.save(self.attrs));
    }

    /// Restore the saved cursor, or home with a default pen if none was saved
    pub fn restore_cursor(&mut self) {
        match self.saved_cursor {
            Some(saved) => {
                self.cursor.restore(&saved, self.rows(), self.cols());
                self.attrs = saved.attrs;
            }
            None => {
                self.cursor = Cursor::new();
                self.attrs.reset();
            }
        }
    }

    fn set_tab_stop(&mut self) {
        if let Some(stop) = self.tab_stops.get_mut(self.cursor.col) {
            *stop = true;
        }
    }

    fn clear_tab_stop(&mut self, which: TabClear) {
        match which {
            TabClear::Current => {
                if let Some(stop) = self.tab_stops.get_mut(self.cursor.col) {
                    *stop = false;
                }
            }
            TabClear::All => self.tab_stops.fill(false),
        }
    }

    fn device_status(&mut self, report: u16) {
        match report {
            5 => self.responses.extend_from_slice(b"\x1b[0n"),
            6 => {
                let reply = format!("\x1b[{};{}R", self.cursor.row + 1, self.cursor.col + 1);
                self.responses.extend_from_slice(reply.as_bytes());
            }
            _ => tracing::debug!("Unsupported device status report: {}", report),
        }
    }

    /// Full reset (RIS): power-on state at the current size
    pub fn reset(&mut self) {
        let responses = std::mem::take(&mut self.responses);
        *self = Self::with_tab_width(self.cols(), self.rows(), self.tab_width);
        self.responses = responses;
    }

    /// Resize the screen. Content stays anchored at the top-left; the cursor
    /// and saved cursor are clamped, the scroll region and tab stops reset.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols() && rows == self.rows() {
            return;
        }

        self.grid.resize(cols, rows);
        self.cursor.clamp(rows, cols);
        if let Some(saved) = self.saved_cursor.as_mut() {
            saved.clamp(rows, cols);
        }
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.tab_stops = default_tab_stops(cols, self.tab_width);
    }
}

fn default_tab_stops(cols: usize, tab_width: usize) -> Vec<bool> {
    (0..cols).map(|col| col > 0 && col % tab_width == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;
    use crate::parser::Parser;

    fn feed(screen: &mut Screen, bytes: &[u8]) {
        for op in Parser::new().parse(bytes) {
            screen.apply(op);
        }
    }

    fn cursor(screen: &Screen) -> (usize, usize) {
        (screen.cursor().row, screen.cursor().col)
    }

    #[test]
    fn test_screen_new() {
        let screen = Screen::new(80, 24);
        assert_eq!(screen.cols(), 80);
        assert_eq!(screen.rows(), 24);
        assert_eq!(cursor(&screen), (0, 0));
        assert_eq!(screen.scroll_region(), (0, 23));
        assert!(screen.modes().autowrap);
        assert!(screen.modes().cursor_visible);
    }

    #[test]
    fn test_print_char() {
        let mut screen = Screen::new(80, 24);
        screen.print_char('A');
        screen.print_char('B');

        assert_eq!(screen.cell(0, 0).map(|c| c.c), Some('A'));
        assert_eq!(screen.cell(0, 1).map(|c| c.c), Some('B'));
        assert_eq!(cursor(&screen), (0, 2));
    }

    #[test]
    fn test_autowrap() {
        let mut screen = Screen::new(5, 3);
        feed(&mut screen, b"ABCDE");

        assert_eq!(cursor(&screen), (1, 0));
        assert!(screen.grid().row(0).is_some_and(|r| r.wrapped));

        feed(&mut screen, b"F");
        assert_eq!(screen.row_text(0), "ABCDE");
        assert_eq!(screen.row_text(1), "F");
    }

    #[test]
    fn test_autowrap_disabled_overwrites_last_column() {
        let mut screen = Screen::new(5, 3);
        feed(&mut screen, b"\x1b[?7lABCDEFG");

        assert_eq!(screen.row_text(0), "ABCDG");
        assert_eq!(cursor(&screen), (0, 4));
    }

    #[test]
    fn test_linefeed_and_scroll() {
        let mut screen = Screen::new(10, 3);
        feed(&mut screen, b"one\r\ntwo\r\nthree\r\nfour");

        assert_eq!(screen.row_text(0), "two");
        assert_eq!(screen.row_text(1), "three");
        assert_eq!(screen.row_text(2), "four");
        assert_eq!(cursor(&screen), (2, 4));
    }

    #[test]
    fn test_linefeed_newline_mode() {
        let mut screen = Screen::new(10, 3);
        feed(&mut screen, b"\x1b[20hab\ncd");
        assert_eq!(screen.row_text(1), "cd");
        assert_eq!(cursor(&screen), (1, 2));
    }

    #[test]
    fn test_scroll_uses_current_background() {
        let mut screen = Screen::new(4, 2);
        feed(&mut screen, b"\x1b[44m\n\n");
        assert_eq!(screen.cell(1, 0).map(|c| c.bg), Some(Color::BLUE));
    }

    #[test]
    fn test_erase_in_display() {
        let mut screen = Screen::new(10, 3);
        feed(&mut screen, b"aaaa\r\nbbbb\r\ncccc\x1b[2;3H\x1b[J");

        assert_eq!(screen.row_text(0), "aaaa");
        assert_eq!(screen.row_text(1), "bb");
        assert_eq!(screen.row_text(2), "");

        feed(&mut screen, b"\x1b[1J");
        assert_eq!(screen.row_text(0), "");
        assert_eq!(screen.row_text(1), "");
    }

    #[test]
    fn test_erase_in_line() {
        let mut screen = Screen::new(10, 1);
        feed(&mut screen, b"abcdefgh\x1b[4G\x1b[1K");
        assert_eq!(screen.row_text(0), "    efgh");

        feed(&mut screen, b"\x1b[K");
        assert_eq!(screen.row_text(0), "");
    }

    #[test]
    fn test_scroll_region() {
        let mut screen = Screen::new(10, 5);
        feed(&mut screen, b"0\r\n1\r\n2\r\n3\r\n4");
        feed(&mut screen, b"\x1b[2;4r");

        assert_eq!(screen.scroll_region(), (1, 3));
        assert_eq!(cursor(&screen), (0, 0));

        feed(&mut screen, b"\x1b[4;1H\nX");
        assert_eq!(screen.row_text(0), "0");
        assert_eq!(screen.row_text(1), "2");
        assert_eq!(screen.row_text(2), "3");
        assert_eq!(screen.row_text(3), "X");
        assert_eq!(screen.row_text(4), "4");
    }

    #[test]
    fn test_invalid_scroll_region_resets() {
        let mut screen = Screen::new(10, 5);
        feed(&mut screen, b"\x1b[2;4r\x1b[4;2r");
        assert_eq!(screen.scroll_region(), (0, 4));
        feed(&mut screen, b"\x1b[2;40r");
        assert_eq!(screen.scroll_region(), (0, 4));
    }

    #[test]
    fn test_reverse_index_scrolls_at_top() {
        let mut screen = Screen::new(10, 3);
        feed(&mut screen, b"a\r\nb\r\nc\x1b[H\x1bM");
        assert_eq!(screen.row_text(0), "");
        assert_eq!(screen.row_text(1), "a");
        assert_eq!(screen.row_text(2), "b");
    }

    #[test]
    fn test_insert_delete_lines() {
        let mut screen = Screen::new(10, 4);
        feed(&mut screen, b"a\r\nb\r\nc\r\nd\x1b[2;3H\x1b[L");

        assert_eq!(cursor(&screen), (1, 0));
        assert_eq!(screen.row_text(1), "");
        assert_eq!(screen.row_text(2), "b");
        assert_eq!(screen.row_text(3), "c");

        feed(&mut screen, b"\x1b[2M");
        assert_eq!(screen.row_text(1), "c");
        assert_eq!(screen.row_text(2), "");
        assert_eq!(screen.row_text(3), "");
    }

    #[test]
    fn test_insert_delete_chars() {
        let mut screen = Screen::new(10, 1);
        feed(&mut screen, b"abcdef\x1b[3G\x1b[2@");
        assert_eq!(screen.row_text(0), "ab  cdef");

        feed(&mut screen, b"\x1b[3P");
        assert_eq!(screen.row_text(0), "abdef");

        feed(&mut screen, b"\x1b[2X");
        assert_eq!(screen.row_text(0), "ab  f");
    }

    #[test]
    fn test_insert_mode() {
        let mut screen = Screen::new(10, 1);
        feed(&mut screen, b"abc\x1b[1G\x1b[4hX");
        assert_eq!(screen.row_text(0), "Xabc");
        assert_eq!(cursor(&screen), (0, 1));
    }

    #[test]
    fn test_resize() {
        let mut screen = Screen::new(10, 5);
        feed(&mut screen, b"hello\x1b[5;9H\x1b7\x1b[2;4r");

        screen.resize(4, 3);
        assert_eq!(screen.cols(), 4);
        assert_eq!(screen.rows(), 3);
        assert_eq!(screen.row_text(0), "hell");
        assert_eq!(screen.scroll_region(), (0, 2));

        feed(&mut screen, b"\x1b8");
        assert_eq!(cursor(&screen), (2, 3));
    }

    #[test]
    fn test_tab_stops() {
        let mut screen = Screen::new(20, 1);
        feed(&mut screen, b"\t");
        assert_eq!(cursor(&screen), (0, 8));
        feed(&mut screen, b"\t\t");
        assert_eq!(cursor(&screen), (0, 19));

        feed(&mut screen, b"\x1b[1G\x1b[3g\x1b[5G\x1bH\x1b[1G\t");
        assert_eq!(cursor(&screen), (0, 4));
    }

    #[test]
    fn test_custom_tab_width() {
        let mut screen = Screen::with_tab_width(20, 1, 4);
        feed(&mut screen, b"\t\t");
        assert_eq!(cursor(&screen), (0, 8));
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut screen = Screen::new(80, 24);
        feed(&mut screen, b"\x1b[5;10H\x1b[31m\x1b7\x1b[H\x1b[0m\x1b8");

        assert_eq!(cursor(&screen), (4, 9));
        assert_eq!(screen.attributes().fg, Color::RED);
    }

    #[test]
    fn test_restore_without_save_homes() {
        let mut screen = Screen::new(80, 24);
        feed(&mut screen, b"\x1b[5;10H\x1b[1m\x1b8");

        assert_eq!(cursor(&screen), (0, 0));
        assert_eq!(*screen.attributes(), Attributes::default());
    }

    #[test]
    fn test_wide_chars() {
        let mut screen = Screen::new(10, 2);
        feed(&mut screen, "世界".as_bytes());

        assert_eq!(screen.cell(0, 0).map(|c| c.width), Some(2));
        assert_eq!(screen.cell(0, 1).map(|c| c.width), Some(0));
        assert_eq!(screen.row_text(0), "世界");
        assert_eq!(cursor(&screen), (0, 4));
    }

    #[test]
    fn test_wide_char_wraps_at_last_column() {
        let mut screen = Screen::new(5, 2);
        feed(&mut screen, "abcd世".as_bytes());

        assert_eq!(screen.row_text(0), "abcd");
        assert_eq!(screen.cell(1, 0).map(|c| c.c), Some('世'));
        assert_eq!(cursor(&screen), (1, 2));
    }

    #[test]
    fn test_overwrite_half_of_wide_char() {
        let mut screen = Screen::new(10, 1);
        feed(&mut screen, "世\x1b[2Gx".as_bytes());

        assert_eq!(screen.cell(0, 0).map(|c| (c.c, c.width)), Some((' ', 1)));
        assert_eq!(screen.cell(0, 1).map(|c| (c.c, c.width)), Some(('x', 1)));
    }

    #[test]
    fn test_zero_width_dropped() {
        let mut screen = Screen::new(10, 1);
        feed(&mut screen, "e\u{0301}".as_bytes());
        assert_eq!(cursor(&screen), (0, 1));
        assert_eq!(screen.row_text(0), "e");
    }

    #[test]
    fn test_device_reports() {
        let mut screen = Screen::new(80, 24);
        feed(&mut screen, b"\x1b[3;7H\x1b[6n\x1b[5n\x1b[c");
        assert_eq!(screen.take_responses(), b"\x1b[3;7R\x1b[0n\x1b[?1;2c".to_vec());
        assert!(screen.take_responses().is_empty());
    }

    #[test]
    fn test_modes_and_title() {
        let mut screen = Screen::new(80, 24);
        feed(&mut screen, b"\x1b[?1h\x1b[?25l\x1b[?2004h\x1b]2;vim\x07");

        assert!(screen.modes().application_cursor_keys);
        assert!(!screen.modes().cursor_visible);
        assert!(screen.modes().bracketed_paste);
        assert_eq!(screen.title(), "vim");
    }

    #[test]
    fn test_reset() {
        let mut screen = Screen::new(10, 3);
        feed(&mut screen, b"text\x1b[31m\x1b[2;3r\x1b[?25l\x1b]0;t\x07\x1bc");

        assert_eq!(screen.row_text(0), "");
        assert_eq!(cursor(&screen), (0, 0));
        assert_eq!(screen.scroll_region(), (0, 2));
        assert_eq!(*screen.modes(), Modes::default());
        assert_eq!(*screen.attributes(), Attributes::default());
        assert_eq!(screen.title(), "");
    }
}
