//! Input Encoding Module
//!
//! Translates key events and pasted text into the byte sequences a program
//! running in the terminal expects.
//!
//! # Keyboard Encoding
//!
//! Different keys produce different sequences depending on:
//! - Application cursor mode (DECCKM)
//! - The configured backspace byte
//! - Modifier keys (Shift, Ctrl, Alt)
//!
//! Cursor and function keys carrying modifiers use the xterm form
//! `CSI 1 ; m X` / `CSI n ; m ~`, where `m` is 1 plus the modifier bitmask.

use serde::{Deserialize, Serialize};

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: true,
    };

    /// Get the modifier parameter for CSI sequences (1 + bitmask)
    /// Shift=1, Alt=2, Ctrl=4
    pub fn as_csi_param(&self) -> u8 {
        let mut param = 1;
        if self.shift {
            param += 1;
        }
        if self.alt {
            param += 2;
        }
        if self.ctrl {
            param += 4;
        }
        param
    }

    /// Check if any modifier is pressed
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

/// A key on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character
    Char(char),

    Enter,
    Backspace,
    Tab,
    Escape,

    // Cursor keys
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,

    /// Function key F1-F12
    F(u8),
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key press without modifiers
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

/// Byte sent by the Backspace key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackspaceMode {
    /// DEL (0x7F)
    #[default]
    Delete,
    /// BS (0x08, ^H)
    ControlH,
}

/// Encoder settings, partly driven by terminal modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputConfig {
    /// DECCKM: cursor keys send SS3 instead of CSI
    pub application_cursor_keys: bool,
    pub backspace: BackspaceMode,
}

const ESC: u8 = 0x1b;

/// Encode a key press into the bytes sent to the child
pub fn encode_key(event: &KeyEvent, config: &InputConfig) -> Vec<u8> {
    let mods = event.modifiers;
    match event.key {
        Key::Char(c) => encode_char(c, mods),

        Key::Enter => alt_prefixed(vec![b'\r'], mods),
        Key::Backspace => {
            let (normal, other) = match config.backspace {
                BackspaceMode::Delete => (0x7f, 0x08),
                BackspaceMode::ControlH => (0x08, 0x7f),
            };
            // Ctrl flips to the other erase byte
            let byte = if mods.ctrl { other } else { normal };
            alt_prefixed(vec![byte], mods)
        }
        Key::Tab if mods.shift => vec![ESC, b'[', b'Z'],
        Key::Tab => alt_prefixed(vec![b'\t'], mods),
        Key::Escape => alt_prefixed(vec![ESC], mods),

        Key::Up => encode_cursor_key(b'A', mods, config.application_cursor_keys),
        Key::Down => encode_cursor_key(b'B', mods, config.application_cursor_keys),
        Key::Right => encode_cursor_key(b'C', mods, config.application_cursor_keys),
        Key::Left => encode_cursor_key(b'D', mods, config.application_cursor_keys),
        Key::Home => encode_cursor_key(b'H', mods, config.application_cursor_keys),
        Key::End => encode_cursor_key(b'F', mods, config.application_cursor_keys),

        Key::Insert => encode_tilde_key(2, mods),
        Key::Delete => encode_tilde_key(3, mods),
        Key::PageUp => encode_tilde_key(5, mods),
        Key::PageDown => encode_tilde_key(6, mods),

        Key::F(n) => encode_function_key(n, mods),
    }
}

fn alt_prefixed(mut bytes: Vec<u8>, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.alt {
        bytes.insert(0, ESC);
    }
    bytes
}

/// Encode a cursor key (arrows, Home, End)
fn encode_cursor_key(code: u8, modifiers: Modifiers, application_mode: bool) -> Vec<u8> {
    if modifiers.any() {
        format!("\x1b[1;{}{}", modifiers.as_csi_param(), code as char).into_bytes()
    } else if application_mode {
        vec![ESC, b'O', code]
    } else {
        vec![ESC, b'[', code]
    }
}

/// Encode a `CSI n ~` key (Insert, Delete, PgUp, PgDn, F5-F12)
fn encode_tilde_key(number: u8, modifiers: Modifiers) -> Vec<u8> {
    if modifiers.any() {
        format!("\x1b[{};{}~", number, modifiers.as_csi_param()).into_bytes()
    } else {
        format!("\x1b[{}~", number).into_bytes()
    }
}

/// Encode function keys; F1-F4 use SS3, F5-F12 the tilde form
fn encode_function_key(number: u8, modifiers: Modifiers) -> Vec<u8> {
    let tilde = match number {
        1..=4 => {
            let code = b'P' + (number - 1);
            return if modifiers.any() {
                format!("\x1b[1;{}{}", modifiers.as_csi_param(), code as char).into_bytes()
            } else {
                vec![ESC, b'O', code]
            };
        }
        5 => 15,
        6 => 17,
        7 => 18,
        8 => 19,
        9 => 20,
        10 => 21,
        11 => 23,
        12 => 24,
        _ => {
            tracing::debug!("No encoding for F{}", number);
            return Vec::new();
        }
    };
    encode_tilde_key(tilde, modifiers)
}

/// Encode a character with modifiers
pub fn encode_char(c: char, modifiers: Modifiers) -> Vec<u8> {
    let bytes = match control_byte(c) {
        Some(byte) if modifiers.ctrl => vec![byte],
        _ => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
    };
    alt_prefixed(bytes, modifiers)
}

/// The C0 byte Ctrl+c produces, if any
fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a' + 1),
        '@'..='_' => Some(c as u8 - b'@'),
        ' ' => Some(0),
        '?' => Some(0x7f),
        _ => None,
    }
}

/// Encode pasted text. Line breaks become CR as typed Enter would; with
/// bracketed paste the text is wrapped in `CSI 200~` / `CSI 201~` and any
/// embedded end marker is removed so the paste cannot terminate early.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
    if !bracketed {
        return normalized.into_bytes();
    }

    let body = normalized.replace("\x1b[201~", "");
    let mut bytes = Vec::with_capacity(body.len() + 12);
    bytes.extend_from_slice(b"\x1b[200~");
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(b"\x1b[201~");
    bytes
}
