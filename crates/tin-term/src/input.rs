// SPDX-License-Identifier: MIT
//
// Terminal input decoding.
//
// Turns raw stdin bytes into logical key events: printable characters,
// control chords, and the named editing/navigation keys. Handles:
//
// - Legacy CSI sequences (arrows, Home/End, PageUp/PageDown, Delete)
// - xterm modifier parameters (`ESC [ 1 ; 5 C` = Ctrl+Right)
// - SS3 sequences (Home/End/arrows from application-keypad terminals)
// - Control bytes (0x01-0x1A as Ctrl chords, 0x7F as Backspace)
// - UTF-8 multi-byte characters
//
// # Design
//
// The parser maintains a small internal byte buffer because escape
// sequences can span multiple `read()` calls. Feed bytes with
// [`Parser::advance`], retrieve events from the returned `Vec`. After a
// timeout with no new bytes, call [`Parser::flush`] to emit any pending
// lone ESC as a real Escape keypress.
//
// Malformed or unrecognized escape sequences never become errors: they
// collapse to a literal Escape key, and the editor ignores stray Escapes.

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// Identity of a key.
///
/// Named keys have dedicated variants; printable input uses
/// [`Char`](Key::Char). Control chords are a `Char` plus
/// [`Modifiers::CTRL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A Unicode character (printable, or the letter of a Ctrl chord).
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Matches the xterm CSI modifier encoding (`param = 1 + bitmask`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

/// A decoded keyboard event: key identity plus active modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: Key,
    /// Active modifier keys.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key event with no modifiers.
    #[must_use]
    pub const fn plain(code: Key) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A Ctrl chord on a letter, e.g. `KeyEvent::ctrl('s')`.
    #[must_use]
    pub const fn ctrl(letter: char) -> Self {
        Self {
            code: Key::Char(letter),
            modifiers: Modifiers::CTRL,
        }
    }

    /// True when this event is exactly Ctrl plus the given letter.
    #[must_use]
    pub fn is_ctrl(&self, letter: char) -> bool {
        self.code == Key::Char(letter) && self.modifiers == Modifiers::CTRL
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Terminal input parser.
///
/// Feed raw bytes via [`advance`](Parser::advance) and collect
/// [`KeyEvent`]s. The parser buffers incomplete sequences internally and
/// resumes when more bytes arrive.
///
/// # Escape vs escape-sequence ambiguity
///
/// A bare `ESC` byte (0x1B) could be either a standalone Escape keypress
/// or the start of a multi-byte escape sequence. The parser keeps a lone
/// ESC pending. The caller waits a short timeout and then calls
/// [`flush`](Parser::flush) to emit the pending ESC as a real Escape key.
pub struct Parser {
    /// Accumulated raw bytes waiting to be parsed.
    buf: Vec<u8>,
}

impl Parser {
    /// Create a new parser with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
        }
    }

    /// Feed raw bytes from stdin and return all events that can be parsed.
    ///
    /// Bytes that form an incomplete sequence are kept in the internal
    /// buffer and combined with future calls. Call [`flush`](Parser::flush)
    /// after a timeout to resolve a pending lone ESC.
    pub fn advance(&mut self, data: &[u8]) -> Vec<KeyEvent> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match try_parse(&self.buf[pos..]) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        // Compact: remove consumed bytes, keep the unconsumed remainder.
        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Are there unconsumed bytes that might complete with more data?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Flush pending bytes as literal key events.
    ///
    /// Called after a timeout to resolve the ESC ambiguity: a lone ESC
    /// byte becomes an Escape key event, and any other leftover bytes
    /// decode as single-byte keys (an unfinished escape sequence thus
    /// degrades to a literal Escape, never an error).
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        for &byte in &self.buf {
            if let Some(event) = decode_single_byte(byte) {
                events.push(event);
            }
        }
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────
//
// All parse functions are pure — they read from the front of a slice and
// return what they found plus how many bytes to consume. No mutable state.

/// Result of one parse attempt at the front of the buffer.
enum Parsed {
    /// A complete event, consuming this many bytes.
    Event(KeyEvent, usize),
    /// Not enough bytes yet — wait for more input.
    Incomplete,
    /// Unusable bytes — drop this many and continue.
    Skip(usize),
}

/// Parse one event from the front of `buf` (never called with an empty
/// slice).
fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        b if b < 0x80 => match decode_single_byte(b) {
            Some(event) => Parsed::Event(event, 1),
            None => Parsed::Skip(1),
        },
        _ => parse_utf8(buf),
    }
}

/// Decode a single non-ESC byte below 0x80.
///
/// Control bytes become Ctrl chords on their letter; 0x7F is Backspace;
/// the line/tab controls keep their named keys. Returns `None` for the
/// few control bytes with no key meaning.
fn decode_single_byte(byte: u8) -> Option<KeyEvent> {
    let event = match byte {
        b'\r' => KeyEvent::plain(Key::Enter),
        b'\t' => KeyEvent::plain(Key::Tab),
        0x7F => KeyEvent::plain(Key::Backspace),
        0x1B => KeyEvent::plain(Key::Escape),
        0x00 => KeyEvent::ctrl('@'),
        b @ 0x01..=0x1A => KeyEvent::ctrl((b + b'a' - 1) as char),
        b @ 0x20..=0x7E => KeyEvent::plain(Key::Char(b as char)),
        _ => return None,
    };
    Some(event)
}

/// Parse an escape sequence starting at `buf[0] == ESC`.
///
/// Dispatch on the second byte: `[` starts a CSI sequence, `O` an SS3
/// sequence. Anything else means the ESC was a standalone keypress; the
/// following byte is left for the next parse round.
fn parse_escape(buf: &[u8]) -> Parsed {
    if buf.len() < 2 {
        // Lone ESC — maybe a sequence head, maybe the Escape key.
        // The timeout flush decides.
        return Parsed::Incomplete;
    }

    match buf[1] {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        _ => Parsed::Event(KeyEvent::plain(Key::Escape), 1),
    }
}

/// Parse a CSI sequence: `ESC [ params final`.
///
/// Parameters are decimal numbers separated by `;`. The final byte is in
/// `0x40..=0x7E`. Unrecognized-but-complete sequences decode to a literal
/// Escape so stray terminal chatter never inserts garbage into the buffer.
fn parse_csi(buf: &[u8]) -> Parsed {
    // Find the final byte, bounding the scan so a garbage stream that
    // never terminates can't grow the pending buffer forever.
    let mut end = 2;
    loop {
        if end >= buf.len() {
            return if end > 16 {
                Parsed::Event(KeyEvent::plain(Key::Escape), end)
            } else {
                Parsed::Incomplete
            };
        }
        if (0x40..=0x7E).contains(&buf[end]) {
            break;
        }
        end += 1;
    }

    let final_byte = buf[end];
    let consumed = end + 1;
    let params = parse_params(&buf[2..end]);

    let event = match final_byte {
        b'A' => arrow_event(Key::Up, &params),
        b'B' => arrow_event(Key::Down, &params),
        b'C' => arrow_event(Key::Right, &params),
        b'D' => arrow_event(Key::Left, &params),
        b'H' => arrow_event(Key::Home, &params),
        b'F' => arrow_event(Key::End, &params),
        b'~' => tilde_event(&params),
        _ => KeyEvent::plain(Key::Escape),
    };

    Parsed::Event(event, consumed)
}

/// Parse an SS3 sequence: `ESC O final`. Some terminals send Home/End and
/// the arrows this way in application-keypad mode.
fn parse_ss3(buf: &[u8]) -> Parsed {
    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match buf[2] {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Escape,
    };
    Parsed::Event(KeyEvent::plain(code), 3)
}

/// Decode the numeric parameters of a CSI sequence (`5;3` → `[5, 3]`).
///
/// Works directly on the byte slice — no intermediate `String`. Malformed
/// digits terminate the list early, which downstream treats like a
/// missing parameter.
fn parse_params(bytes: &[u8]) -> Vec<u16> {
    let mut params = Vec::with_capacity(2);
    let mut current: Option<u16> = None;

    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                let digit = u16::from(b - b'0');
                current = Some(
                    current
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit),
                );
            }
            b';' => {
                params.push(current.take().unwrap_or(0));
            }
            _ => break,
        }
    }
    if let Some(n) = current {
        params.push(n);
    }
    params
}

/// Build an arrow/Home/End event, applying an xterm modifier parameter
/// (`ESC [ 1 ; 5 C` = Ctrl+Right) when present.
fn arrow_event(code: Key, params: &[u16]) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: params.get(1).map_or(Modifiers::empty(), |&m| modifiers_from_param(m)),
    }
}

/// Decode a `~`-terminated editing-key sequence by its first parameter.
fn tilde_event(params: &[u16]) -> KeyEvent {
    let code = match params.first().copied() {
        Some(1 | 7) => Key::Home,
        Some(3) => Key::Delete,
        Some(4 | 8) => Key::End,
        Some(5) => Key::PageUp,
        Some(6) => Key::PageDown,
        _ => Key::Escape,
    };
    KeyEvent {
        code,
        modifiers: params.get(1).map_or(Modifiers::empty(), |&m| modifiers_from_param(m)),
    }
}

/// xterm encodes modifiers as `1 + bitmask` (1=Shift, 2=Alt, 4=Ctrl).
fn modifiers_from_param(param: u16) -> Modifiers {
    #[allow(clippy::cast_possible_truncation)] // Only the low 3 bits matter.
    let mask = param.saturating_sub(1) as u8;
    Modifiers::from_bits_truncate(mask)
}

/// Parse a UTF-8 multi-byte character starting at a byte >= 0x80.
///
/// The lead byte announces the sequence length; if the continuation bytes
/// haven't all arrived yet, wait. Invalid sequences (stray continuation
/// bytes, over-long encodings) are skipped one byte at a time rather than
/// surfaced as errors.
fn parse_utf8(buf: &[u8]) -> Parsed {
    let len = match buf[0] {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return Parsed::Skip(1), // Continuation byte or invalid lead.
    };

    if buf.len() < len {
        return Parsed::Incomplete;
    }

    match std::str::from_utf8(&buf[..len]) {
        Ok(s) => {
            // A valid `len`-byte UTF-8 slice holds exactly one char.
            let ch = s.chars().next().map_or('\u{FFFD}', |c| c);
            Parsed::Event(KeyEvent::plain(Key::Char(ch)), len)
        }
        Err(_) => Parsed::Skip(1),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Feed bytes to a fresh parser and return the decoded events.
    fn parse(bytes: &[u8]) -> Vec<KeyEvent> {
        Parser::new().advance(bytes)
    }

    // ── Printable characters ────────────────────────────────────────

    #[test]
    fn ascii_char() {
        assert_eq!(parse(b"a"), vec![KeyEvent::plain(Key::Char('a'))]);
    }

    #[test]
    fn ascii_run() {
        let events = parse(b"hi!");
        assert_eq!(
            events,
            vec![
                KeyEvent::plain(Key::Char('h')),
                KeyEvent::plain(Key::Char('i')),
                KeyEvent::plain(Key::Char('!')),
            ]
        );
    }

    #[test]
    fn space_is_printable() {
        assert_eq!(parse(b" "), vec![KeyEvent::plain(Key::Char(' '))]);
    }

    // ── Control bytes ───────────────────────────────────────────────

    #[test]
    fn ctrl_s() {
        assert_eq!(parse(&[0x13]), vec![KeyEvent::ctrl('s')]);
    }

    #[test]
    fn ctrl_x() {
        assert_eq!(parse(&[0x18]), vec![KeyEvent::ctrl('x')]);
    }

    #[test]
    fn ctrl_h() {
        assert_eq!(parse(&[0x08]), vec![KeyEvent::ctrl('h')]);
    }

    #[test]
    fn enter_key() {
        assert_eq!(parse(b"\r"), vec![KeyEvent::plain(Key::Enter)]);
    }

    #[test]
    fn tab_key() {
        assert_eq!(parse(b"\t"), vec![KeyEvent::plain(Key::Tab)]);
    }

    #[test]
    fn backspace_key() {
        assert_eq!(parse(&[0x7F]), vec![KeyEvent::plain(Key::Backspace)]);
    }

    #[test]
    fn is_ctrl_matches_chord_only() {
        assert!(KeyEvent::ctrl('s').is_ctrl('s'));
        assert!(!KeyEvent::ctrl('s').is_ctrl('x'));
        assert!(!KeyEvent::plain(Key::Char('s')).is_ctrl('s'));
    }

    // ── CSI sequences ───────────────────────────────────────────────

    #[test]
    fn arrow_keys() {
        assert_eq!(parse(b"\x1b[A"), vec![KeyEvent::plain(Key::Up)]);
        assert_eq!(parse(b"\x1b[B"), vec![KeyEvent::plain(Key::Down)]);
        assert_eq!(parse(b"\x1b[C"), vec![KeyEvent::plain(Key::Right)]);
        assert_eq!(parse(b"\x1b[D"), vec![KeyEvent::plain(Key::Left)]);
    }

    #[test]
    fn home_end_letter_form() {
        assert_eq!(parse(b"\x1b[H"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(parse(b"\x1b[F"), vec![KeyEvent::plain(Key::End)]);
    }

    #[test]
    fn home_end_tilde_forms() {
        assert_eq!(parse(b"\x1b[1~"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(parse(b"\x1b[7~"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(parse(b"\x1b[4~"), vec![KeyEvent::plain(Key::End)]);
        assert_eq!(parse(b"\x1b[8~"), vec![KeyEvent::plain(Key::End)]);
    }

    #[test]
    fn delete_and_paging() {
        assert_eq!(parse(b"\x1b[3~"), vec![KeyEvent::plain(Key::Delete)]);
        assert_eq!(parse(b"\x1b[5~"), vec![KeyEvent::plain(Key::PageUp)]);
        assert_eq!(parse(b"\x1b[6~"), vec![KeyEvent::plain(Key::PageDown)]);
    }

    #[test]
    fn ctrl_right_xterm_modifier() {
        assert_eq!(
            parse(b"\x1b[1;5C"),
            vec![KeyEvent {
                code: Key::Right,
                modifiers: Modifiers::CTRL,
            }]
        );
    }

    #[test]
    fn shift_up_xterm_modifier() {
        assert_eq!(
            parse(b"\x1b[1;2A"),
            vec![KeyEvent {
                code: Key::Up,
                modifiers: Modifiers::SHIFT,
            }]
        );
    }

    #[test]
    fn modified_delete() {
        assert_eq!(
            parse(b"\x1b[3;5~"),
            vec![KeyEvent {
                code: Key::Delete,
                modifiers: Modifiers::CTRL,
            }]
        );
    }

    #[test]
    fn unrecognized_csi_is_escape() {
        assert_eq!(parse(b"\x1b[Z"), vec![KeyEvent::plain(Key::Escape)]);
    }

    #[test]
    fn unrecognized_tilde_param_is_escape() {
        assert_eq!(parse(b"\x1b[9~"), vec![KeyEvent::plain(Key::Escape)]);
    }

    // ── SS3 sequences ───────────────────────────────────────────────

    #[test]
    fn ss3_home_end() {
        assert_eq!(parse(b"\x1bOH"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(parse(b"\x1bOF"), vec![KeyEvent::plain(Key::End)]);
    }

    #[test]
    fn ss3_arrows() {
        assert_eq!(parse(b"\x1bOA"), vec![KeyEvent::plain(Key::Up)]);
        assert_eq!(parse(b"\x1bOD"), vec![KeyEvent::plain(Key::Left)]);
    }

    #[test]
    fn ss3_unknown_is_escape() {
        assert_eq!(parse(b"\x1bOZ"), vec![KeyEvent::plain(Key::Escape)]);
    }

    // ── Escape ambiguity ────────────────────────────────────────────

    #[test]
    fn lone_esc_stays_pending() {
        let mut parser = Parser::new();
        assert_eq!(parser.advance(b"\x1b"), vec![]);
        assert!(parser.has_pending());
    }

    #[test]
    fn flush_resolves_lone_esc() {
        let mut parser = Parser::new();
        parser.advance(b"\x1b");
        assert_eq!(parser.flush(), vec![KeyEvent::plain(Key::Escape)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn esc_then_printable_is_escape_plus_char() {
        let events = parse(b"\x1bq");
        assert_eq!(
            events,
            vec![
                KeyEvent::plain(Key::Escape),
                KeyEvent::plain(Key::Char('q')),
            ]
        );
    }

    #[test]
    fn split_sequence_across_reads() {
        let mut parser = Parser::new();
        assert_eq!(parser.advance(b"\x1b["), vec![]);
        assert!(parser.has_pending());
        assert_eq!(parser.advance(b"A"), vec![KeyEvent::plain(Key::Up)]);
        assert!(!parser.has_pending());
    }

    #[test]
    fn split_tilde_sequence_across_reads() {
        let mut parser = Parser::new();
        assert_eq!(parser.advance(b"\x1b[5"), vec![]);
        assert_eq!(parser.advance(b"~"), vec![KeyEvent::plain(Key::PageUp)]);
    }

    #[test]
    fn flush_of_partial_csi_degrades_to_escape() {
        let mut parser = Parser::new();
        parser.advance(b"\x1b[");
        let events = parser.flush();
        // ESC becomes the Escape key; '[' decodes as itself.
        assert_eq!(
            events,
            vec![
                KeyEvent::plain(Key::Escape),
                KeyEvent::plain(Key::Char('[')),
            ]
        );
    }

    // ── UTF-8 ───────────────────────────────────────────────────────

    #[test]
    fn two_byte_utf8() {
        assert_eq!(
            parse("é".as_bytes()),
            vec![KeyEvent::plain(Key::Char('é'))]
        );
    }

    #[test]
    fn three_byte_utf8() {
        assert_eq!(
            parse("中".as_bytes()),
            vec![KeyEvent::plain(Key::Char('中'))]
        );
    }

    #[test]
    fn four_byte_utf8() {
        assert_eq!(
            parse("🦀".as_bytes()),
            vec![KeyEvent::plain(Key::Char('🦀'))]
        );
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "é".as_bytes();
        let mut parser = Parser::new();
        assert_eq!(parser.advance(&bytes[..1]), vec![]);
        assert_eq!(
            parser.advance(&bytes[1..]),
            vec![KeyEvent::plain(Key::Char('é'))]
        );
    }

    #[test]
    fn stray_continuation_byte_skipped() {
        assert_eq!(parse(&[0x80, b'a']), vec![KeyEvent::plain(Key::Char('a'))]);
    }

    #[test]
    fn invalid_utf8_sequence_skipped() {
        // 0xC2 lead followed by a non-continuation byte.
        let events = parse(&[0xC2, b'a']);
        assert_eq!(events, vec![KeyEvent::plain(Key::Char('a'))]);
    }

    #[test]
    fn mixed_input_stream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"a");
        bytes.extend_from_slice(b"\x1b[C");
        bytes.extend_from_slice("ß".as_bytes());
        bytes.extend_from_slice(&[0x13]);
        let events = parse(&bytes);
        assert_eq!(
            events,
            vec![
                KeyEvent::plain(Key::Char('a')),
                KeyEvent::plain(Key::Right),
                KeyEvent::plain(Key::Char('ß')),
                KeyEvent::ctrl('s'),
            ]
        );
    }
}
