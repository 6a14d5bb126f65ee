//! Terminal Operations
//!
//! Semantic operations produced by the parser that should be applied to the
//! screen. The parser decides what a byte sequence means; the screen decides
//! what that meaning does to the grid.

use serde::{Deserialize, Serialize};

use crate::core::Color;

/// An operation produced by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Print a character at the cursor position
    Print(char),

    /// LF, VT, FF
    LineFeed,

    /// CR
    CarriageReturn,

    /// BS
    Backspace,

    /// HT
    Tab,

    /// BEL
    Bell,

    /// ESC D - move down one row, scrolling at the bottom margin
    Index,

    /// ESC E - index plus carriage return
    NextLine,

    /// ESC M - move up one row, scrolling at the top margin
    ReverseIndex,

    /// Cursor movement (CUU, CUD, CUP, ...)
    MoveCursor(CursorMove),

    /// One SGR attribute change
    SetAttribute(Attribute),

    /// EL
    EraseLine(EraseMode),

    /// ED
    EraseDisplay(EraseMode),

    /// ECH - blank n cells starting at the cursor
    EraseChars(usize),

    /// ICH
    InsertChars(usize),

    /// DCH
    DeleteChars(usize),

    /// IL
    InsertLines(usize),

    /// DL
    DeleteLines(usize),

    /// SU
    ScrollUp(usize),

    /// SD
    ScrollDown(usize),

    /// DECSTBM. Rows are 0-indexed and inclusive; `None` bottom means the
    /// last row of the screen.
    ScrollRegion { top: usize, bottom: Option<usize> },

    /// ESC 7 / CSI s
    SaveCursor,

    /// ESC 8 / CSI u
    RestoreCursor,

    /// SM/RM and DECSET/DECRST
    SetMode { mode: Mode, enabled: bool },

    /// ESC H (HTS)
    SetTabStop,

    /// TBC
    ClearTabStop(TabClear),

    /// OSC 0 / OSC 2
    SetTitle(String),

    /// DSR with the requested report number
    DeviceStatus(u16),

    /// Primary DA
    DeviceAttributes,

    /// ESC c (RIS)
    Reset,

    /// Unsupported or malformed sequence, with the raw bytes that formed it
    Unknown(Vec<u8>),
}

impl Operation {
    /// Check if this is a print operation
    pub fn is_print(&self) -> bool {
        matches!(self, Operation::Print(_))
    }

    /// Check if this is an unknown operation
    pub fn is_unknown(&self) -> bool {
        matches!(self, Operation::Unknown(_))
    }
}

/// Cursor movement. Counts are already defaulted (0 means 1); absolute
/// positions are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorMove {
    Up(usize),
    Down(usize),
    Forward(usize),
    Backward(usize),
    /// CNL - down n rows and to column 0
    NextLine(usize),
    /// CPL - up n rows and to column 0
    PrevLine(usize),
    /// CHA / HPA
    Column(usize),
    /// VPA
    Row(usize),
    /// CUP / HVP
    To { row: usize, col: usize },
}

/// Erase extent for EL/ED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EraseMode {
    /// 0: cursor to end
    ToEnd,
    /// 1: start to cursor (inclusive)
    ToStart,
    /// 2: everything
    All,
}

impl EraseMode {
    /// Map an EL/ED parameter; ED 3 (erase saved lines) behaves as ED 2
    pub fn from_param(param: u16, display: bool) -> Option<Self> {
        match param {
            0 => Some(EraseMode::ToEnd),
            1 => Some(EraseMode::ToStart),
            2 => Some(EraseMode::All),
            3 if display => Some(EraseMode::All),
            _ => None,
        }
    }
}

/// Terminal modes settable from the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// IRM (4)
    Insert,
    /// LNM (20)
    LineFeedNewLine,
    /// DECCKM (?1)
    ApplicationCursorKeys,
    /// DECAWM (?7)
    AutoWrap,
    /// DECTCEM (?25)
    ShowCursor,
    /// xterm bracketed paste (?2004)
    BracketedPaste,
}

impl Mode {
    /// Look up an ANSI (non-private) mode number
    pub fn ansi(param: u16) -> Option<Self> {
        match param {
            4 => Some(Mode::Insert),
            20 => Some(Mode::LineFeedNewLine),
            _ => None,
        }
    }

    /// Look up a DEC private mode number
    pub fn dec(param: u16) -> Option<Self> {
        match param {
            1 => Some(Mode::ApplicationCursorKeys),
            7 => Some(Mode::AutoWrap),
            25 => Some(Mode::ShowCursor),
            2004 => Some(Mode::BracketedPaste),
            _ => None,
        }
    }
}

/// TBC extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabClear {
    /// Clear the stop at the cursor column
    Current,
    /// Clear every stop
    All,
}

/// A single SGR attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// SGR 0
    Reset,
    Bold(bool),
    Faint(bool),
    Italic(bool),
    Underline(bool),
    Blink(bool),
    Inverse(bool),
    Hidden(bool),
    Strikethrough(bool),
    /// SGR 22 clears both bold and faint
    NormalIntensity,
    Foreground(Color),
    Background(Color),
}
