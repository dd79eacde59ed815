//! Row — one line of text as raw bytes plus a derived render form.
//!
//! A `Row` owns two byte sequences. `raw` is the line exactly as stored in
//! the file. `render` is what the screen shows: tabs expanded to the next
//! tab stop, everything else copied through. Alongside `render` the row
//! tracks `visible_len`, the number of user-perceived characters — every
//! byte of `raw` counts except UTF-8 continuation bytes.
//!
//! # Consistency
//!
//! `render` and `visible_len` are derived state and are never observed
//! stale: every mutator rebuilds them before returning, so any reader
//! (renderer, cursor mapping, search) sees values that match the current
//! `raw`. The rebuild is O(len) and runs on every edit — cheap enough at
//! line granularity to do unconditionally rather than track dirtiness.
//!
//! # Unicode stance
//!
//! The editor tracks UTF-8 *byte-sequence boundaries* and nothing more.
//! A multi-byte character occupies several raw bytes but one visible
//! column; wide glyphs and grapheme clusters are out of scope on purpose.

use std::fmt;

/// Tab stop width in render columns. Tabs expand with spaces up to the
/// next multiple of this.
pub const TAB_STOP: usize = 4;

/// True for a UTF-8 continuation byte (`10xxxxxx`) — part of, but not the
/// first byte of, a multi-byte sequence.
#[inline]
#[must_use]
pub const fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One line of text: raw bytes, derived render bytes, visible length.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    raw: Vec<u8>,
    render: Vec<u8>,
    visible_len: usize,
}

impl Row {
    /// Create a row from raw bytes, deriving the render form.
    #[must_use]
    pub fn new(raw: Vec<u8>) -> Self {
        let mut row = Self {
            raw,
            render: Vec::new(),
            visible_len: 0,
        };
        row.rebuild_render();
        row
    }

    /// An empty row.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    // -- Accessors ----------------------------------------------------------

    /// The raw bytes of the line.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The render form: tabs expanded, everything else copied through.
    #[inline]
    #[must_use]
    pub fn render(&self) -> &[u8] {
        &self.render
    }

    /// Raw length in bytes. This is the range of valid cursor columns:
    /// `0..=len()`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True when the raw line is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Render form length in bytes.
    #[inline]
    #[must_use]
    pub fn render_len(&self) -> usize {
        self.render.len()
    }

    /// Number of user-perceived characters: every raw byte counts except
    /// UTF-8 continuation bytes.
    #[inline]
    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible_len
    }

    // -- Mutation (crate-internal; TextBuffer owns the dirty counter) -------

    /// Insert one byte at `at`. An out-of-range `at` clamps to the end.
    pub(crate) fn insert_byte(&mut self, at: usize, byte: u8) {
        let at = at.min(self.raw.len());
        self.raw.insert(at, byte);
        self.rebuild_render();
    }

    /// Delete the byte at `at`. An out-of-range `at` is a no-op; returns
    /// whether anything was removed.
    pub(crate) fn delete_byte(&mut self, at: usize) -> bool {
        if at >= self.raw.len() {
            return false;
        }
        self.raw.remove(at);
        self.rebuild_render();
        true
    }

    /// Append bytes to the end of the line.
    pub(crate) fn append(&mut self, bytes: &[u8]) {
        self.raw.extend_from_slice(bytes);
        self.rebuild_render();
    }

    /// Drop everything from byte offset `at` onward.
    pub(crate) fn truncate(&mut self, at: usize) {
        self.raw.truncate(at);
        self.rebuild_render();
    }

    // -- Derivation ---------------------------------------------------------

    /// Rebuild `render` and `visible_len` from the current `raw`.
    ///
    /// One pass: a TAB emits spaces up to the next tab stop, a
    /// continuation byte copies through contributing 0 to the visible
    /// length, every other byte copies through contributing 1.
    fn rebuild_render(&mut self) {
        self.render.clear();
        self.visible_len = 0;

        for &byte in &self.raw {
            if byte == b'\t' {
                self.render.push(b' ');
                while self.render.len() % TAB_STOP != 0 {
                    self.render.push(b' ');
                }
                self.visible_len += 1;
            } else {
                self.render.push(byte);
                if !is_continuation(byte) {
                    self.visible_len += 1;
                }
            }
        }
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row({:?})", String::from_utf8_lossy(&self.raw))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
