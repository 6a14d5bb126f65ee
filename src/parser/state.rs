//! Parser State Machine
//!
//! A byte-at-a-time parser for the VT100/xterm control sequence subset the
//! screen understands. The parser handles arbitrary chunk boundaries: an
//! unterminated sequence simply leaves the parser in a non-ground state
//! until more bytes arrive.
//!
//! The state layout follows "A parser for DEC's ANSI-compatible video
//! terminals" by Paul Williams (<https://vt100.net/emu/dec_ansi_parser>),
//! reduced to the states this terminal needs:
//!
//! - Ground: printable text, C0 controls, UTF-8 decoding
//! - Escape / EscapeIntermediate: after ESC
//! - CsiEntry / CsiParam / CsiIntermediate: collecting a CSI sequence
//! - OscString / OscEscape: collecting an OSC payload (ESC seen, maybe ST)
//! - StringPassthrough / StringEscape: DCS, SOS, PM and APC, consumed whole
//!
//! Malformed input never stalls the parser. An illegal byte outside Ground
//! abandons the sequence, emits [`Operation::Unknown`] with the bytes seen
//! so far, and returns to Ground.

use crate::core::Color;

use super::action::{Attribute, CursorMove, EraseMode, Mode, Operation, TabClear};

/// Parameters beyond this count are dropped
pub const MAX_PARAMS: usize = 16;

/// OSC payload bytes beyond this length are dropped
pub const MAX_OSC_LEN: usize = 4096;

/// Raw bytes kept for [`Operation::Unknown`]
pub const MAX_RAW_LEN: usize = 64;

const MAX_INTERMEDIATES: usize = 4;

/// Maximum colon sub-parameters kept per parameter
const MAX_SUBPARAMS: usize = 6;

const REPLACEMENT: char = '\u{FFFD}';

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    OscString,
    OscEscape,
    StringPassthrough,
    StringEscape,
}

/// The terminal parser
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Completed CSI parameters
    params: Vec<u16>,
    /// Colon sub-parameters, one group per entry in `params`
    subparams: Vec<Vec<u16>>,
    /// Top-level parameters seen, including those past the cap
    param_count: usize,
    /// The value being accumulated follows a `:`
    in_subparam: bool,
    /// Parameter being accumulated
    current_param: u16,
    /// Whether a digit has been seen for the current parameter
    param_has_digit: bool,
    /// Leading `?`, `>`, `<` or `=` of a CSI sequence
    private_marker: Option<u8>,
    /// Intermediate bytes (0x20-0x2F)
    intermediates: Vec<u8>,
    /// OSC payload
    osc: Vec<u8>,
    /// Bytes of the sequence in progress, for Unknown
    raw: Vec<u8>,
    /// UTF-8 decoder state
    utf8_buffer: [u8; 4],
    utf8_len: usize,
    utf8_remaining: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: Vec::with_capacity(MAX_PARAMS),
            subparams: Vec::with_capacity(MAX_PARAMS),
            param_count: 0,
            in_subparam: false,
            current_param: 0,
            param_has_digit: false,
            private_marker: None,
            intermediates: Vec::with_capacity(MAX_INTERMEDIATES),
            osc: Vec::with_capacity(256),
            raw: Vec::with_capacity(MAX_RAW_LEN),
            utf8_buffer: [0; 4],
            utf8_len: 0,
            utf8_remaining: 0,
        }
    }

    /// Reset the parser to the ground state, discarding any partial sequence
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.clear_sequence();
        self.utf8_len = 0;
        self.utf8_remaining = 0;
    }

    /// Whether the parser is between sequences
    pub fn is_ground(&self) -> bool {
        self.state == State::Ground && self.utf8_remaining == 0
    }

    /// Process a chunk of bytes, returning operations
    pub fn parse(&mut self, data: &[u8]) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(data.len());
        for &byte in data {
            self.advance(byte, &mut ops);
        }
        ops
    }

    /// Process a single byte, appending zero or more operations
    pub fn advance(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if self.utf8_remaining > 0 {
            self.utf8_continue(byte, ops);
            return;
        }

        match byte {
            // CAN, SUB - cancel the current sequence
            0x18 | 0x1A => {
                if self.state == State::Ground {
                    ops.push(Operation::Unknown(vec![byte]));
                } else {
                    self.fail(ops);
                }
                return;
            }
            0x1B => {
                self.process_escape_byte(ops);
                return;
            }
            _ => {}
        }

        if self.state != State::Ground && byte >= 0x20 {
            self.record(byte);
        }

        match self.state {
            State::Ground => self.process_ground(byte, ops),
            State::Escape => self.process_escape(byte, ops),
            State::EscapeIntermediate => self.process_escape_intermediate(byte, ops),
            State::CsiEntry => self.process_csi_entry(byte, ops),
            State::CsiParam => self.process_csi_param(byte, ops),
            State::CsiIntermediate => self.process_csi_intermediate(byte, ops),
            State::OscString => self.process_osc_string(byte, ops),
            State::OscEscape => self.process_string_escape(byte, ops, true),
            State::StringPassthrough => {}
            State::StringEscape => self.process_string_escape(byte, ops, false),
        }
    }

    /// Clear all per-sequence buffers
    fn clear_sequence(&mut self) {
        self.params.clear();
        self.subparams.clear();
        self.param_count = 0;
        self.in_subparam = false;
        self.current_param = 0;
        self.param_has_digit = false;
        self.private_marker = None;
        self.intermediates.clear();
        self.osc.clear();
        self.raw.clear();
    }

    fn record(&mut self, byte: u8) {
        if self.raw.len() < MAX_RAW_LEN {
            self.raw.push(byte);
        }
    }

    /// Abandon the sequence in progress
    fn fail(&mut self, ops: &mut Vec<Operation>) {
        ops.push(Operation::Unknown(std::mem::take(&mut self.raw)));
        self.state = State::Ground;
        self.clear_sequence();
    }

    /// Finish a sequence and return to ground
    fn finish(&mut self, ops: &mut Vec<Operation>, op: Operation) {
        ops.push(op);
        self.state = State::Ground;
        self.clear_sequence();
    }

    fn unknown(&self) -> Operation {
        Operation::Unknown(self.raw.clone())
    }

    /// ESC arrives: start a sequence, or maybe terminate a string
    fn process_escape_byte(&mut self, ops: &mut Vec<Operation>) {
        match self.state {
            State::OscString => {
                self.record(0x1B);
                self.state = State::OscEscape;
                return;
            }
            State::StringPassthrough => {
                self.record(0x1B);
                self.state = State::StringEscape;
                return;
            }
            State::Ground => {}
            _ => self.fail(ops),
        }
        self.clear_sequence();
        self.record(0x1B);
        self.state = State::Escape;
    }

    /// Map a C0 control to its operation
    fn execute(byte: u8) -> Option<Operation> {
        match byte {
            0x00 => None,
            0x07 => Some(Operation::Bell),
            0x08 => Some(Operation::Backspace),
            0x09 => Some(Operation::Tab),
            0x0A..=0x0C => Some(Operation::LineFeed),
            0x0D => Some(Operation::CarriageReturn),
            _ => Some(Operation::Unknown(vec![byte])),
        }
    }

    /// C0 controls inside ESC/CSI execute without disturbing the sequence;
    /// DEL is ignored everywhere
    fn process_control_in_sequence(byte: u8, ops: &mut Vec<Operation>) -> bool {
        if byte < 0x20 {
            ops.extend(Self::execute(byte));
            return true;
        }
        byte == 0x7F
    }

    /// Process bytes in ground state (normal text)
    fn process_ground(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        match byte {
            0x00..=0x1F => ops.extend(Self::execute(byte)),
            0x7F => {}
            0x20..=0x7E => ops.push(Operation::Print(byte as char)),
            _ => self.utf8_start(byte, ops),
        }
    }

    /// Start a multi-byte UTF-8 sequence
    fn utf8_start(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        let remaining = match byte {
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            _ => {
                ops.push(Operation::Print(REPLACEMENT));
                return;
            }
        };
        self.utf8_buffer[0] = byte;
        self.utf8_len = 1;
        self.utf8_remaining = remaining;
    }

    /// Process a UTF-8 continuation byte
    fn utf8_continue(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if !(0x80..=0xBF).contains(&byte) {
            // Truncated sequence: replace it, then handle this byte normally
            self.utf8_len = 0;
            self.utf8_remaining = 0;
            ops.push(Operation::Print(REPLACEMENT));
            self.advance(byte, ops);
            return;
        }

        self.utf8_buffer[self.utf8_len] = byte;
        self.utf8_len += 1;
        self.utf8_remaining -= 1;

        if self.utf8_remaining == 0 {
            let c = std::str::from_utf8(&self.utf8_buffer[..self.utf8_len])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(REPLACEMENT);
            self.utf8_len = 0;
            ops.push(Operation::Print(c));
        }
    }

    /// Process bytes in escape state
    fn process_escape(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if Self::process_control_in_sequence(byte, ops) {
            return;
        }
        match byte {
            b'[' => self.state = State::CsiEntry,
            b']' => self.state = State::OscString,
            // DCS, SOS, PM, APC
            b'P' | b'X' | b'^' | b'_' => self.state = State::StringPassthrough,
            0x20..=0x2F => {
                self.intermediates.push(byte);
                self.state = State::EscapeIntermediate;
            }
            0x30..=0x7E => {
                let op = self.dispatch_esc(byte);
                self.finish(ops, op);
            }
            _ => self.fail(ops),
        }
    }

    /// Process bytes in escape intermediate state
    fn process_escape_intermediate(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if Self::process_control_in_sequence(byte, ops) {
            return;
        }
        match byte {
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            0x30..=0x7E => {
                let op = self.dispatch_esc(byte);
                self.finish(ops, op);
            }
            _ => self.fail(ops),
        }
    }

    /// Dispatch an ESC sequence
    fn dispatch_esc(&self, final_byte: u8) -> Operation {
        if !self.intermediates.is_empty() {
            // Character set designations and the like
            return self.unknown();
        }
        match final_byte {
            b'7' => Operation::SaveCursor,
            b'8' => Operation::RestoreCursor,
            b'D' => Operation::Index,
            b'E' => Operation::NextLine,
            b'M' => Operation::ReverseIndex,
            b'H' => Operation::SetTabStop,
            b'c' => Operation::Reset,
            _ => self.unknown(),
        }
    }

    /// Process bytes in CSI entry state
    fn process_csi_entry(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if Self::process_control_in_sequence(byte, ops) {
            return;
        }
        self.state = State::CsiParam;
        match byte {
            b'<' | b'=' | b'>' | b'?' => self.private_marker = Some(byte),
            _ => self.process_csi_param(byte, ops),
        }
    }

    /// Process bytes in CSI param state
    fn process_csi_param(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if Self::process_control_in_sequence(byte, ops) {
            return;
        }
        match byte {
            b'0'..=b'9' => {
                self.current_param = self
                    .current_param
                    .saturating_mul(10)
                    .saturating_add(u16::from(byte - b'0'));
                self.param_has_digit = true;
            }
            b';' => {
                self.end_value();
                self.in_subparam = false;
            }
            b':' => {
                self.end_value();
                self.in_subparam = true;
            }
            0x20..=0x2F => {
                self.finish_params();
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => {
                self.finish_params();
                self.dispatch_csi(byte, ops);
            }
            // Private marker after parameters, or a non-ASCII byte
            _ => self.fail(ops),
        }
    }

    /// Process bytes in CSI intermediate state
    fn process_csi_intermediate(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        if Self::process_control_in_sequence(byte, ops) {
            return;
        }
        match byte {
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            0x40..=0x7E => self.dispatch_csi(byte, ops),
            // Parameter bytes after an intermediate, or a non-ASCII byte
            _ => self.fail(ops),
        }
    }

    fn push_param(&mut self, value: u16) {
        self.param_count += 1;
        if self.params.len() < MAX_PARAMS {
            self.params.push(value);
            self.subparams.push(Vec::new());
        }
    }

    /// Append to the group of the last parameter, unless that parameter
    /// was dropped by the cap
    fn push_subparam(&mut self, value: u16) {
        if self.param_count > MAX_PARAMS {
            return;
        }
        if let Some(group) = self.subparams.last_mut() {
            if group.len() < MAX_SUBPARAMS {
                group.push(value);
            }
        }
    }

    /// Close the value being accumulated
    fn end_value(&mut self) {
        if self.in_subparam {
            self.push_subparam(self.current_param);
        } else {
            self.push_param(self.current_param);
        }
        self.current_param = 0;
        self.param_has_digit = false;
    }

    fn finish_params(&mut self) {
        if self.param_has_digit || !self.params.is_empty() {
            self.end_value();
        }
    }

    /// Parameter at index, or default when absent
    fn param(&self, index: usize, default: u16) -> u16 {
        self.params.get(index).copied().unwrap_or(default)
    }

    /// Count parameter: absent or 0 both mean 1
    fn count(&self, index: usize) -> usize {
        match self.params.get(index) {
            Some(&0) | None => 1,
            Some(&n) => usize::from(n),
        }
    }

    /// 1-based position parameter converted to 0-based
    fn position(&self, index: usize) -> usize {
        self.count(index) - 1
    }

    /// Dispatch a complete CSI sequence
    fn dispatch_csi(&mut self, final_byte: u8, ops: &mut Vec<Operation>) {
        if !self.intermediates.is_empty() {
            let op = self.unknown();
            self.finish(ops, op);
            return;
        }

        match self.private_marker {
            None => self.dispatch_csi_ansi(final_byte, ops),
            Some(b'?') if matches!(final_byte, b'h' | b'l') => {
                self.dispatch_modes(final_byte == b'h', Mode::dec, ops);
            }
            Some(_) => ops.push(self.unknown()),
        }

        self.state = State::Ground;
        self.clear_sequence();
    }

    fn dispatch_csi_ansi(&self, final_byte: u8, ops: &mut Vec<Operation>) {
        let op = match final_byte {
            b'A' => Operation::MoveCursor(CursorMove::Up(self.count(0))),
            b'B' | b'e' => Operation::MoveCursor(CursorMove::Down(self.count(0))),
            b'C' | b'a' => Operation::MoveCursor(CursorMove::Forward(self.count(0))),
            b'D' => Operation::MoveCursor(CursorMove::Backward(self.count(0))),
            b'E' => Operation::MoveCursor(CursorMove::NextLine(self.count(0))),
            b'F' => Operation::MoveCursor(CursorMove::PrevLine(self.count(0))),
            b'G' | b'`' => Operation::MoveCursor(CursorMove::Column(self.position(0))),
            b'd' => Operation::MoveCursor(CursorMove::Row(self.position(0))),
            b'H' | b'f' => Operation::MoveCursor(CursorMove::To {
                row: self.position(0),
                col: self.position(1),
            }),
            b'J' => match EraseMode::from_param(self.param(0, 0), true) {
                Some(mode) => Operation::EraseDisplay(mode),
                None => self.unknown(),
            },
            b'K' => match EraseMode::from_param(self.param(0, 0), false) {
                Some(mode) => Operation::EraseLine(mode),
                None => self.unknown(),
            },
            b'X' => Operation::EraseChars(self.count(0)),
            b'@' => Operation::InsertChars(self.count(0)),
            b'P' => Operation::DeleteChars(self.count(0)),
            b'L' => Operation::InsertLines(self.count(0)),
            b'M' => Operation::DeleteLines(self.count(0)),
            b'S' => Operation::ScrollUp(self.count(0)),
            b'T' => Operation::ScrollDown(self.count(0)),
            b'r' => Operation::ScrollRegion {
                top: self.position(0),
                bottom: match self.param(1, 0) {
                    0 => None,
                    n => Some(usize::from(n) - 1),
                },
            },
            b'm' => {
                push_sgr(&self.params, &self.subparams, ops);
                return;
            }
            b's' if self.params.is_empty() => Operation::SaveCursor,
            b'u' if self.params.is_empty() => Operation::RestoreCursor,
            b'h' | b'l' => {
                self.dispatch_modes(final_byte == b'h', Mode::ansi, ops);
                return;
            }
            b'g' => match self.param(0, 0) {
                0 => Operation::ClearTabStop(TabClear::Current),
                3 => Operation::ClearTabStop(TabClear::All),
                _ => self.unknown(),
            },
            b'n' => match self.param(0, 0) {
                n @ (5 | 6) => Operation::DeviceStatus(n),
                _ => self.unknown(),
            },
            b'c' if self.param(0, 0) == 0 => Operation::DeviceAttributes,
            _ => self.unknown(),
        };
        ops.push(op);
    }

    /// SM/RM and DECSET/DECRST carry one mode per parameter
    fn dispatch_modes(
        &self,
        enabled: bool,
        lookup: fn(u16) -> Option<Mode>,
        ops: &mut Vec<Operation>,
    ) {
        let mut unsupported = self.params.is_empty();
        for &param in &self.params {
            match lookup(param) {
                Some(mode) => ops.push(Operation::SetMode { mode, enabled }),
                None => unsupported = true,
            }
        }
        if unsupported {
            ops.push(self.unknown());
        }
    }

    /// Process bytes in OSC string state
    fn process_osc_string(&mut self, byte: u8, ops: &mut Vec<Operation>) {
        match byte {
            // BEL terminates OSC (xterm extension)
            0x07 => self.dispatch_osc(ops),
            0x00..=0x1F | 0x7F => {}
            _ => {
                if self.osc.len() < MAX_OSC_LEN {
                    self.osc.push(byte);
                }
            }
        }
    }

    /// After ESC inside a string: `\` is ST, anything else abandons the
    /// string and starts a fresh escape sequence with this byte
    fn process_string_escape(&mut self, byte: u8, ops: &mut Vec<Operation>, osc: bool) {
        if byte == b'\\' {
            if osc {
                self.dispatch_osc(ops);
            } else {
                self.fail(ops);
            }
            return;
        }
        self.fail(ops);
        self.record(0x1B);
        self.state = State::Escape;
        self.advance(byte, ops);
    }

    /// Dispatch a terminated OSC sequence
    fn dispatch_osc(&mut self, ops: &mut Vec<Operation>) {
        let (command, payload) = match self.osc.iter().position(|&b| b == b';') {
            Some(split) => (&self.osc[..split], &self.osc[split + 1..]),
            None => (&self.osc[..], &[][..]),
        };
        let op = match command {
            b"0" | b"2" => Operation::SetTitle(String::from_utf8_lossy(payload).into_owned()),
            _ => self.unknown(),
        };
        self.finish(ops, op);
    }
}

/// Expand SGR parameters into one operation per attribute. A parameter
/// with colon sub-parameters (`4:3`, `38:2::r:g:b`) is decoded from its own
/// group and never consumes the parameters after it.
fn push_sgr(params: &[u16], subparams: &[Vec<u16>], ops: &mut Vec<Operation>) {
    if params.is_empty() {
        ops.push(Operation::SetAttribute(Attribute::Reset));
        return;
    }

    let mut i = 0;
    while i < params.len() {
        let p = params[i];
        let group = subparams.get(i).map(Vec::as_slice).unwrap_or(&[]);
        i += 1;

        if !group.is_empty() {
            if let Some(attr) = sgr_group(p, group) {
                ops.push(Operation::SetAttribute(attr));
            } else {
                tracing::debug!("Unsupported SGR sub-parameters: {}:{:?}", p, group);
            }
            continue;
        }

        let attr = match p {
            0 => Attribute::Reset,
            1 => Attribute::Bold(true),
            2 => Attribute::Faint(true),
            3 => Attribute::Italic(true),
            4 | 21 => Attribute::Underline(true),
            5 | 6 => Attribute::Blink(true),
            7 => Attribute::Inverse(true),
            8 => Attribute::Hidden(true),
            9 => Attribute::Strikethrough(true),
            22 => Attribute::NormalIntensity,
            23 => Attribute::Italic(false),
            24 => Attribute::Underline(false),
            25 => Attribute::Blink(false),
            27 => Attribute::Inverse(false),
            28 => Attribute::Hidden(false),
            29 => Attribute::Strikethrough(false),
            30..=37 => Attribute::Foreground(Color::Indexed((p - 30) as u8)),
            39 => Attribute::Foreground(Color::Default),
            40..=47 => Attribute::Background(Color::Indexed((p - 40) as u8)),
            49 => Attribute::Background(Color::Default),
            90..=97 => Attribute::Foreground(Color::Indexed((p - 90 + 8) as u8)),
            100..=107 => Attribute::Background(Color::Indexed((p - 100 + 8) as u8)),
            38 | 48 => {
                let Some((color, consumed)) = extended_color(&params[i..]) else {
                    tracing::debug!("Malformed extended color in SGR: {:?}", params);
                    return;
                };
                i += consumed;
                if p == 38 {
                    Attribute::Foreground(color)
                } else {
                    Attribute::Background(color)
                }
            }
            _ => {
                tracing::debug!("Unsupported SGR parameter: {}", p);
                continue;
            }
        };
        ops.push(Operation::SetAttribute(attr));
    }
}

/// Decode a parameter carrying colon sub-parameters
fn sgr_group(p: u16, group: &[u16]) -> Option<Attribute> {
    match p {
        // 4:0 is off; 4:1 through 4:5 are underline styles, all drawn alike
        4 => group.first().map(|&style| Attribute::Underline(style != 0)),
        38 => colon_color(group).map(Attribute::Foreground),
        48 => colon_color(group).map(Attribute::Background),
        _ => None,
    }
}

/// `5:n`, `2:r:g:b`, or `2:colorspace:r:g:b`
fn colon_color(group: &[u16]) -> Option<Color> {
    let component = |v: u16| u8::try_from(v).ok();
    match group {
        [5, n] => Some(Color::Indexed(component(*n)?)),
        [2, r, g, b] | [2, _, r, g, b, ..] => Some(Color::Rgb(
            component(*r)?,
            component(*g)?,
            component(*b)?,
        )),
        _ => None,
    }
}

/// Parse the tail of `38;5;n` or `38;2;r;g;b`, returning the color and the
/// number of parameters consumed
fn extended_color(rest: &[u16]) -> Option<(Color, usize)> {
    let component = |v: u16| u8::try_from(v).ok();
    match rest {
        [5, n, ..] => Some((Color::Indexed(component(*n)?), 2)),
        [2, r, g, b, ..] => Some((
            Color::Rgb(component(*r)?, component(*g)?, component(*b)?),
            4,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Vec<Operation> {
        Parser::new().parse(bytes)
    }

    #[test]
    fn test_parser_print() {
        let ops = parse(b"Hello");

        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0], Operation::Print('H'));
        assert_eq!(ops[4], Operation::Print('o'));
    }

    #[test]
    fn test_parser_c0_controls() {
        let ops = parse(b"A\nB\rC\x07\x08\t");

        assert_eq!(
            ops,
            vec![
                Operation::Print('A'),
                Operation::LineFeed,
                Operation::Print('B'),
                Operation::CarriageReturn,
                Operation::Print('C'),
                Operation::Bell,
                Operation::Backspace,
                Operation::Tab,
            ]
        );
    }

    #[test]
    fn test_parser_csi_cursor_up() {
        assert_eq!(
            parse(b"\x1b[5A"),
            vec![Operation::MoveCursor(CursorMove::Up(5))]
        );
        // Zero and missing counts both mean one
        assert_eq!(
            parse(b"\x1b[0A\x1b[A"),
            vec![
                Operation::MoveCursor(CursorMove::Up(1)),
                Operation::MoveCursor(CursorMove::Up(1)),
            ]
        );
    }

    #[test]
    fn test_parser_csi_cup() {
        assert_eq!(
            parse(b"\x1b[10;20H"),
            vec![Operation::MoveCursor(CursorMove::To { row: 9, col: 19 })]
        );
        assert_eq!(
            parse(b"\x1b[H"),
            vec![Operation::MoveCursor(CursorMove::To { row: 0, col: 0 })]
        );
        assert_eq!(
            parse(b"\x1b[;5H"),
            vec![Operation::MoveCursor(CursorMove::To { row: 0, col: 4 })]
        );
    }

    #[test]
    fn test_parser_erase() {
        assert_eq!(
            parse(b"\x1b[2J\x1b[K\x1b[1K"),
            vec![
                Operation::EraseDisplay(EraseMode::All),
                Operation::EraseLine(EraseMode::ToEnd),
                Operation::EraseLine(EraseMode::ToStart),
            ]
        );
        assert_eq!(parse(b"\x1b[7J"), vec![Operation::Unknown(b"\x1b[7J".to_vec())]);
    }

    #[test]
    fn test_parser_sgr() {
        let ops = parse(b"\x1b[1;31;48;2;255;128;0m");

        assert_eq!(
            ops,
            vec![
                Operation::SetAttribute(Attribute::Bold(true)),
                Operation::SetAttribute(Attribute::Foreground(Color::RED)),
                Operation::SetAttribute(Attribute::Background(Color::Rgb(255, 128, 0))),
            ]
        );
    }

    #[test]
    fn test_parser_sgr_empty_is_reset() {
        assert_eq!(
            parse(b"\x1b[m"),
            vec![Operation::SetAttribute(Attribute::Reset)]
        );
    }

    #[test]
    fn test_parser_sgr_256_and_bright() {
        assert_eq!(
            parse(b"\x1b[38;5;200;94;103m"),
            vec![
                Operation::SetAttribute(Attribute::Foreground(Color::Indexed(200))),
                Operation::SetAttribute(Attribute::Foreground(Color::Indexed(12))),
                Operation::SetAttribute(Attribute::Background(Color::Indexed(11))),
            ]
        );
    }

    #[test]
    fn test_parser_sgr_colon_underline_style() {
        assert_eq!(
            parse(b"\x1b[4:3mA"),
            vec![
                Operation::SetAttribute(Attribute::Underline(true)),
                Operation::Print('A'),
            ]
        );
        assert_eq!(
            parse(b"\x1b[4:0m"),
            vec![Operation::SetAttribute(Attribute::Underline(false))]
        );
    }

    #[test]
    fn test_parser_sgr_colon_colors() {
        assert_eq!(
            parse(b"\x1b[38:2::10:20:30;1m"),
            vec![
                Operation::SetAttribute(Attribute::Foreground(Color::Rgb(10, 20, 30))),
                Operation::SetAttribute(Attribute::Bold(true)),
            ]
        );
        assert_eq!(
            parse(b"\x1b[48:2:1:2:3m\x1b[38:5:123m"),
            vec![
                Operation::SetAttribute(Attribute::Background(Color::Rgb(1, 2, 3))),
                Operation::SetAttribute(Attribute::Foreground(Color::Indexed(123))),
            ]
        );
    }

    #[test]
    fn test_parser_sgr_bad_colon_group_is_contained() {
        // The malformed group is skipped; the parameters after it still apply
        assert_eq!(
            parse(b"\x1b[38:9:1;3m"),
            vec![Operation::SetAttribute(Attribute::Italic(true))]
        );
    }

    #[test]
    fn test_parser_private_modes() {
        assert_eq!(
            parse(b"\x1b[?1;25h"),
            vec![
                Operation::SetMode {
                    mode: Mode::ApplicationCursorKeys,
                    enabled: true
                },
                Operation::SetMode {
                    mode: Mode::ShowCursor,
                    enabled: true
                },
            ]
        );
        assert_eq!(
            parse(b"\x1b[?1049h"),
            vec![Operation::Unknown(b"\x1b[?1049h".to_vec())]
        );
    }

    #[test]
    fn test_parser_save_restore() {
        assert_eq!(
            parse(b"\x1b7\x1b8\x1b[s\x1b[u"),
            vec![
                Operation::SaveCursor,
                Operation::RestoreCursor,
                Operation::SaveCursor,
                Operation::RestoreCursor,
            ]
        );
    }

    #[test]
    fn test_parser_scroll_region() {
        assert_eq!(
            parse(b"\x1b[2;4r\x1b[r"),
            vec![
                Operation::ScrollRegion {
                    top: 1,
                    bottom: Some(3)
                },
                Operation::ScrollRegion {
                    top: 0,
                    bottom: None
                },
            ]
        );
    }

    #[test]
    fn test_parser_osc_title() {
        assert_eq!(
            parse(b"\x1b]0;My Title\x07"),
            vec![Operation::SetTitle("My Title".to_string())]
        );
        assert_eq!(
            parse(b"\x1b]2;Other\x1b\\"),
            vec![Operation::SetTitle("Other".to_string())]
        );
    }

    #[test]
    fn test_parser_osc_unknown_command() {
        let ops = parse(b"\x1b]8;;https://example.com\x07X");
        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_unknown());
        assert_eq!(ops[1], Operation::Print('X'));
    }

    #[test]
    fn test_parser_dcs_is_consumed() {
        let ops = parse(b"\x1bPq#0;2;0;0;0\x1b\\A");
        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_unknown());
        assert_eq!(ops[1], Operation::Print('A'));
    }

    #[test]
    fn test_parser_utf8() {
        let ops = parse("Hello 世界".as_bytes());

        assert_eq!(ops.len(), 8);
        assert_eq!(ops[6], Operation::Print('世'));
        assert_eq!(ops[7], Operation::Print('界'));
    }

    #[test]
    fn test_parser_invalid_utf8_is_replaced_and_reprocessed() {
        // A lead byte followed by ASCII: replacement, then the ASCII byte
        assert_eq!(
            parse(&[0xE4, b'A']),
            vec![Operation::Print(REPLACEMENT), Operation::Print('A')]
        );
        assert_eq!(parse(&[0xFF]), vec![Operation::Print(REPLACEMENT)]);
    }

    #[test]
    fn test_parser_chunk_boundary() {
        let mut parser = Parser::new();

        let ops1 = parser.parse(b"\x1b[");
        let ops2 = parser.parse(b"5");
        assert!(!parser.is_ground());
        let ops3 = parser.parse(b"A");

        assert!(ops1.is_empty());
        assert!(ops2.is_empty());
        assert_eq!(ops3, vec![Operation::MoveCursor(CursorMove::Up(5))]);
        assert!(parser.is_ground());
    }

    #[test]
    fn test_parser_utf8_chunk_boundary() {
        let mut parser = Parser::new();

        // UTF-8 for '世' is E4 B8 96
        assert!(parser.parse(&[0xE4]).is_empty());
        assert!(parser.parse(&[0xB8]).is_empty());
        assert_eq!(parser.parse(&[0x96]), vec![Operation::Print('世')]);
    }

    #[test]
    fn test_parser_cancel_sequence() {
        let ops = parse(b"\x1b[5\x18A");

        assert_eq!(
            ops,
            vec![Operation::Unknown(b"\x1b[5".to_vec()), Operation::Print('A')]
        );
    }

    #[test]
    fn test_parser_cancel_in_ground_is_unknown() {
        assert_eq!(
            parse(b"a\x18\x1ab"),
            vec![
                Operation::Print('a'),
                Operation::Unknown(vec![0x18]),
                Operation::Unknown(vec![0x1A]),
                Operation::Print('b'),
            ]
        );
    }

    #[test]
    fn test_parser_illegal_byte_resets() {
        // A private marker after parameters is illegal
        let ops = parse(b"\x1b[1?hA");
        assert_eq!(
            ops,
            vec![Operation::Unknown(b"\x1b[1?".to_vec()), Operation::Print('h'), Operation::Print('A')]
        );
    }

    #[test]
    fn test_parser_unknown_final_byte() {
        assert_eq!(parse(b"\x1b[5y"), vec![Operation::Unknown(b"\x1b[5y".to_vec())]);
        assert_eq!(parse(b"\x1bZ"), vec![Operation::Unknown(b"\x1bZ".to_vec())]);
    }

    #[test]
    fn test_parser_control_inside_csi_executes() {
        assert_eq!(
            parse(b"\x1b[2\nB"),
            vec![
                Operation::LineFeed,
                Operation::MoveCursor(CursorMove::Down(2)),
            ]
        );
    }

    #[test]
    fn test_parser_escape_restarts_sequence() {
        let ops = parse(b"\x1b[12\x1b[3D");
        assert_eq!(
            ops,
            vec![
                Operation::Unknown(b"\x1b[12".to_vec()),
                Operation::MoveCursor(CursorMove::Backward(3)),
            ]
        );
    }

    #[test]
    fn test_parser_param_cap() {
        let mut seq = b"\x1b[".to_vec();
        for _ in 0..40 {
            seq.extend_from_slice(b"1;");
        }
        seq.extend_from_slice(b"1m");
        let ops = parse(&seq);
        assert_eq!(ops.len(), MAX_PARAMS);
        assert!(ops
            .iter()
            .all(|op| *op == Operation::SetAttribute(Attribute::Bold(true))));
    }

    #[test]
    fn test_parser_huge_param_saturates() {
        assert_eq!(
            parse(b"\x1b[99999999C"),
            vec![Operation::MoveCursor(CursorMove::Forward(usize::from(u16::MAX)))]
        );
    }

    #[test]
    fn test_parser_charset_designation_is_unknown() {
        let ops = parse(b"\x1b(B");
        assert_eq!(ops, vec![Operation::Unknown(b"\x1b(B".to_vec())]);
    }

    #[test]
    fn test_parser_reset() {
        let mut parser = Parser::new();
        parser.parse(b"\x1b]0;unterminated");
        parser.reset();
        assert!(parser.is_ground());
        assert_eq!(parser.parse(b"x"), vec![Operation::Print('x')]);
    }
}
