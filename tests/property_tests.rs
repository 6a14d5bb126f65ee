//! Property tests for the parser and screen
//!
//! Arbitrary byte streams must never panic, must leave the cursor inside the
//! grid, and must produce the same screen however they are split.

use proptest::prelude::*;

use tinyterm::{Parser, Session};

/// Bytes biased towards escape sequences so the parser leaves ground often
fn terminal_bytes() -> impl Strategy<Value = Vec<u8>> {
    let fragment = prop_oneof![
        4 => any::<u8>().prop_map(|b| vec![b]),
        2 => "[ -~]{1,8}".prop_map(String::into_bytes),
        1 => Just(b"\x1b[".to_vec()),
        1 => Just(b"\x1b]0;".to_vec()),
        1 => Just(b"\r\n".to_vec()),
        1 => (0u16..120, 0u16..120).prop_map(|(r, c)| format!("\x1b[{};{}H", r, c).into_bytes()),
        1 => (0u16..300).prop_map(|n| format!("\x1b[38;5;{}m", n).into_bytes()),
        1 => prop::sample::select(vec!["\x1b[2J", "\x1b[K", "\x1b[3L", "\x1b[2M", "\x1b[4P", "\x1b[2@"])
            .prop_map(|s| s.as_bytes().to_vec()),
        1 => prop::sample::select(vec!["\x1b7", "\x1b8", "\x1bM", "\x1b[2;4r", "\x1b[?7l", "\x1b[?25l"])
            .prop_map(|s| s.as_bytes().to_vec()),
        1 => Just("中é".as_bytes().to_vec()),
    ];
    prop::collection::vec(fragment, 0..64).prop_map(|parts| parts.concat())
}

fn assert_cursor_in_bounds(session: &Session) {
    let snapshot = session.snapshot();
    assert!(snapshot.cursor_row < snapshot.rows);
    assert!(snapshot.cursor_col < snapshot.cols);
    assert_eq!(snapshot.lines.len(), snapshot.rows);
    assert!(snapshot.lines.iter().all(|line| line.len() == snapshot.cols));
}

proptest! {
    #[test]
    fn parser_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut parser = Parser::new();
        let _ = parser.parse(&bytes);
    }

    #[test]
    fn byte_at_a_time_matches_whole(bytes in terminal_bytes()) {
        let mut whole = Session::new(20, 6);
        whole.feed(&bytes);

        let mut split = Session::new(20, 6);
        for byte in &bytes {
            split.feed(std::slice::from_ref(byte));
        }

        let (a, b) = (whole.snapshot(), split.snapshot());
        prop_assert!(a.content_equals(&b));
        prop_assert_eq!(a.title, b.title);
    }

    #[test]
    fn parse_splits_are_equivalent(bytes in terminal_bytes(), at in any::<prop::sample::Index>()) {
        let at = at.index(bytes.len() + 1);

        let mut parser = Parser::new();
        let whole = parser.parse(&bytes);

        let mut parser = Parser::new();
        let mut split = parser.parse(&bytes[..at]);
        split.extend(parser.parse(&bytes[at..]));

        prop_assert_eq!(whole, split);
    }

    #[test]
    fn cursor_stays_in_bounds(
        first in terminal_bytes(),
        second in terminal_bytes(),
        cols in 1usize..40,
        rows in 1usize..12,
    ) {
        let mut session = Session::new(10, 5);
        session.feed(&first);
        assert_cursor_in_bounds(&session);

        session.resize(cols, rows).unwrap();
        assert_cursor_in_bounds(&session);

        session.feed(&second);
        assert_cursor_in_bounds(&session);
    }

    #[test]
    fn tiny_screens_survive(bytes in terminal_bytes()) {
        let mut session = Session::new(1, 1);
        session.feed(&bytes);
        assert_cursor_in_bounds(&session);
    }
}
