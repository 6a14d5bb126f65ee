//! Renderer interface
//!
//! Renderers consume [`Snapshot`]s; they never touch live session state.
//! [`AnsiRenderer`] redraws a snapshot onto any writer using cursor
//! positioning and SGR sequences, which is enough to display the emulated
//! screen inside the host terminal. It also mirrors the emulated cursor-key
//! and bracketed-paste modes onto the host, so the host terminal sends the
//! key sequences the child expects.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::core::{Cell, Color, Snapshot, Style};

/// Something that can present a frame
pub trait Renderer {
    type Error;

    /// Draw one frame
    fn present(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error>;
}

/// Draws snapshots as ANSI escape sequences
pub struct AnsiRenderer<W: Write> {
    out: W,
    /// Generation of the last frame drawn
    last_generation: Option<u64>,
    last_title: String,
    /// (DECCKM, bracketed paste) last set on the host
    last_modes: Option<(bool, bool)>,
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_generation: None,
            last_title: String::new(),
            last_modes: None,
        }
    }

    /// Force the next `present` to redraw even if nothing changed
    pub fn invalidate(&mut self) {
        self.last_generation = None;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Encode a full frame
    fn encode(&self, snapshot: &Snapshot) -> String {
        let mut frame = String::with_capacity(snapshot.cols * snapshot.rows * 2);
        frame.push_str("\x1b[?25l\x1b[0m");

        if snapshot.title != self.last_title {
            let _ = write!(frame, "\x1b]2;{}\x07", sanitize_title(&snapshot.title));
        }

        let modes = (snapshot.application_cursor_keys, snapshot.bracketed_paste);
        if self.last_modes != Some(modes) {
            push_mode(&mut frame, 1, modes.0);
            push_mode(&mut frame, 2004, modes.1);
        }

        for (row, line) in snapshot.lines.iter().enumerate() {
            let _ = write!(frame, "\x1b[{};1H", row + 1);
            let mut pen: Option<(Color, Color, Style)> = None;
            for cell in line.iter().filter(|c| !c.is_wide_continuation()) {
                let attrs = (cell.fg, cell.bg, cell.style);
                if pen != Some(attrs) {
                    push_sgr(&mut frame, cell);
                    pen = Some(attrs);
                }
                frame.push(if cell.c.is_control() { ' ' } else { cell.c });
            }
            frame.push_str("\x1b[0m");
        }

        let _ = write!(
            frame,
            "\x1b[{};{}H",
            snapshot.cursor_row + 1,
            snapshot.cursor_col + 1
        );
        if snapshot.cursor_visible {
            frame.push_str("\x1b[?25h");
        }
        frame
    }
}

impl<W: Write> Renderer for AnsiRenderer<W> {
    type Error = io::Error;

    fn present(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        if self.last_generation == Some(snapshot.generation) {
            return Ok(());
        }

        let frame = self.encode(snapshot);
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;

        self.last_generation = Some(snapshot.generation);
        self.last_modes = Some((snapshot.application_cursor_keys, snapshot.bracketed_paste));
        if snapshot.title != self.last_title {
            self.last_title.clone_from(&snapshot.title);
        }
        Ok(())
    }
}

/// DECSET/DECRST for one private mode
fn push_mode(frame: &mut String, mode: u16, enabled: bool) {
    let _ = write!(frame, "\x1b[?{}{}", mode, if enabled { 'h' } else { 'l' });
}

/// Append the SGR sequence selecting a cell's attributes
fn push_sgr(frame: &mut String, cell: &Cell) {
    frame.push_str("\x1b[0");
    let style = &cell.style;
    for (on, code) in [
        (style.bold, "1"),
        (style.faint, "2"),
        (style.italic, "3"),
        (style.underline, "4"),
        (style.blink, "5"),
        (style.inverse, "7"),
        (style.hidden, "8"),
        (style.strikethrough, "9"),
    ] {
        if on {
            frame.push(';');
            frame.push_str(code);
        }
    }
    push_color(frame, cell.fg, 30);
    push_color(frame, cell.bg, 40);
    frame.push('m');
}

/// `base` is 30 for foreground, 40 for background
fn push_color(frame: &mut String, color: Color, base: u8) {
    let _ = match color {
        Color::Default => Ok(()),
        Color::Indexed(n) if n < 8 => write!(frame, ";{}", base + n),
        Color::Indexed(n) if n < 16 => write!(frame, ";{}", base + 60 + n - 8),
        Color::Indexed(n) => write!(frame, ";{};5;{}", base + 8, n),
        Color::Rgb(r, g, b) => write!(frame, ";{};2;{};{};{}", base + 8, r, g, b),
    };
}

/// Titles come from the child; keep control bytes out of the OSC
fn sanitize_title(title: &str) -> String {
    title.chars().filter(|c| !c.is_control()).collect()
}
