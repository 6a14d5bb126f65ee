//! Terminal Cell
//!
//! Represents a single cell in the terminal grid, containing a character
//! and its associated styling attributes, plus the attribute state that the
//! interpreter stamps onto newly printed cells.

use serde::{Deserialize, Serialize};

/// A single cell in the terminal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// The character in this cell. A space for blank cells and for the
    /// continuation half of a wide character.
    pub c: char,
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Text style attributes
    pub style: Style,
    /// Display width: 1 normal, 2 wide glyph, 0 continuation of a wide glyph
    pub width: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            fg: Color::Default,
            bg: Color::Default,
            style: Style::default(),
            width: 1,
        }
    }
}

impl Cell {
    /// Create a new cell with a single character and default attributes
    pub fn new(c: char) -> Self {
        Self {
            c,
            ..Default::default()
        }
    }

    /// Create a cell carrying the given attributes
    pub fn with_attributes(c: char, attrs: &Attributes) -> Self {
        Self {
            c,
            fg: attrs.fg,
            bg: attrs.bg,
            style: attrs.style,
            width: 1,
        }
    }

    /// A blank cell that keeps only a background color (for erase operations)
    pub fn blank(bg: Color) -> Self {
        Self {
            bg,
            ..Default::default()
        }
    }

    /// Check if this cell is blank (space with no styling)
    pub fn is_blank(&self) -> bool {
        self.c == ' ' && self.style == Style::default() && self.bg == Color::Default
    }

    /// Check if this cell is the second half of a wide character
    pub fn is_wide_continuation(&self) -> bool {
        self.width == 0
    }

    /// Clear the cell but preserve background color (for erase operations)
    pub fn erase(&mut self, bg: Color) {
        *self = Self::blank(bg);
    }
}

/// Color representation supporting indexed and RGB colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Default terminal color (foreground or background)
    #[default]
    Default,
    /// 256-color palette index (0-15 are the ANSI colors)
    Indexed(u8),
    /// 24-bit RGB color
    Rgb(u8, u8, u8),
}

impl Color {
    /// Standard ANSI colors (0-7)
    pub const BLACK: Color = Color::Indexed(0);
    pub const RED: Color = Color::Indexed(1);
    pub const GREEN: Color = Color::Indexed(2);
    pub const YELLOW: Color = Color::Indexed(3);
    pub const BLUE: Color = Color::Indexed(4);
    pub const MAGENTA: Color = Color::Indexed(5);
    pub const CYAN: Color = Color::Indexed(6);
    pub const WHITE: Color = Color::Indexed(7);

    /// Convert a 256-color index to RGB using the xterm palette
    pub fn indexed_to_rgb(index: u8) -> (u8, u8, u8) {
        match index {
            0 => (0, 0, 0),
            1 => (205, 0, 0),
            2 => (0, 205, 0),
            3 => (205, 205, 0),
            4 => (0, 0, 238),
            5 => (205, 0, 205),
            6 => (0, 205, 205),
            7 => (229, 229, 229),
            8 => (127, 127, 127),
            9 => (255, 0, 0),
            10 => (0, 255, 0),
            11 => (255, 255, 0),
            12 => (92, 92, 255),
            13 => (255, 0, 255),
            14 => (0, 255, 255),
            15 => (255, 255, 255),
            // 6x6x6 color cube
            16..=231 => {
                let n = index - 16;
                let to_rgb = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
                (to_rgb(n / 36), to_rgb((n % 36) / 6), to_rgb(n % 6))
            }
            // Grayscale ramp
            232..=255 => {
                let gray = 8 + (index - 232) * 10;
                (gray, gray, gray)
            }
        }
    }

    /// Convert this color to RGB, using light-on-black for Default
    pub fn to_rgb(self, is_foreground: bool) -> (u8, u8, u8) {
        match self {
            Color::Default if is_foreground => (229, 229, 229),
            Color::Default => (0, 0, 0),
            Color::Indexed(i) => Self::indexed_to_rgb(i),
            Color::Rgb(r, g, b) => (r, g, b),
        }
    }
}

/// Text style attributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub bold: bool,
    pub faint: bool,
    pub italic: bool,
    pub underline: bool,
    pub blink: bool,
    pub inverse: bool,
    pub hidden: bool,
    pub strikethrough: bool,
}

/// The pen applied to newly printed cells (SGR state)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub fg: Color,
    pub bg: Color,
    pub style: Style,
}

impl Attributes {
    /// Reset to default colors and no style (SGR 0)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
