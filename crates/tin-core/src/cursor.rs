//! Cursor — position tracking and raw↔render column mapping.
//!
//! The cursor is a `(row, col)` pair. `row` ranges over `0..=nrows`; the
//! value `nrows` is the virtual row past the last line, where the cursor
//! sits in an empty buffer or after stepping past all content. `col` is a
//! **raw byte offset** into the current row, with one invariant held at
//! all times: it never addresses a UTF-8 continuation byte. It is either
//! a lead byte, a plain byte, or the end of the row.
//!
//! The render column (what the screen shows) is never stored — it is
//! recomputed from `col` via [`raw_to_render`] whenever needed, so there
//! is no second coordinate to keep in sync through edits.
//!
//! # Multi-byte movement
//!
//! Arrow movement always skips whole UTF-8 sequences: Left lands on the
//! previous lead byte, Right lands after the full sequence, and vertical
//! movement clamps to the new row's length and then snaps left off any
//! continuation byte it landed on.

use crate::buffer::TextBuffer;
use crate::row::{Row, TAB_STOP, is_continuation};

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Map a raw byte offset to a render column.
///
/// Walks the raw bytes in `[0, col)`: a TAB advances the running render
/// column to the next tab stop, a continuation byte contributes 0, any
/// other byte contributes 1.
#[must_use]
pub fn raw_to_render(row: &Row, col: usize) -> usize {
    let mut render_col = 0;
    for &byte in row.raw().iter().take(col) {
        if byte == b'\t' {
            render_col += TAB_STOP - (render_col % TAB_STOP);
        } else if !is_continuation(byte) {
            render_col += 1;
        }
    }
    render_col
}

/// Map a render column back to a raw byte offset — the inverse walk.
///
/// Accumulates the same per-byte contribution until the running total
/// exceeds `render_col` and returns the offset of the byte that crossed
/// the threshold, or the row length if `render_col` lies beyond the row.
/// This is how a substring match in the render form becomes a cursor
/// position.
#[must_use]
pub fn render_to_raw(row: &Row, render_col: usize) -> usize {
    let mut current = 0;
    for (i, &byte) in row.raw().iter().enumerate() {
        if byte == b'\t' {
            current += TAB_STOP - (current % TAB_STOP);
        } else if !is_continuation(byte) {
            current += 1;
        }
        if current > render_col {
            return i;
        }
    }
    row.len()
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// A cursor position: row index and raw byte column.
///
/// Lightweight value type; the buffer is passed into movement methods as
/// a parameter rather than owned or referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub(crate) row: usize,
    pub(crate) col: usize,
}

impl Cursor {
    /// A cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Current row index (may equal the row count — the virtual row).
    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Current raw byte column.
    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    /// Place the cursor at an exact position. The caller is responsible
    /// for the position being on a character boundary (all in-crate users
    /// derive it from [`render_to_raw`] or a stored row length).
    pub const fn move_to(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
    }

    /// The cursor's render column in the current row (0 on the virtual
    /// row past the end).
    #[must_use]
    pub fn render_col(&self, buf: &TextBuffer) -> usize {
        buf.row(self.row).map_or(0, |r| raw_to_render(r, self.col))
    }

    // -- Movement -----------------------------------------------------------

    /// Move one character left; at column 0, wrap to the end of the
    /// previous row.
    pub fn move_left(&mut self, buf: &TextBuffer) {
        if self.col > 0 {
            self.col -= 1;
            // Land on the lead byte of a multi-byte sequence.
            while self.col > 0 && self.on_continuation(buf) {
                self.col -= 1;
            }
        } else if self.row > 0 {
            self.row -= 1;
            self.col = buf.row(self.row).map_or(0, Row::len);
        }
    }

    /// Move one character right; at the end of a row, wrap to column 0 of
    /// the next row.
    pub fn move_right(&mut self, buf: &TextBuffer) {
        let Some(row) = buf.row(self.row) else {
            return; // Virtual row: nothing to the right.
        };
        if self.col < row.len() {
            self.col += 1;
            // Step past the whole sequence.
            while self.col < row.len() && self.on_continuation(buf) {
                self.col += 1;
            }
        } else {
            self.row += 1;
            self.col = 0;
        }
    }

    /// Move up one row, clamping the column to the new row.
    pub fn move_up(&mut self, buf: &TextBuffer) {
        if self.row > 0 {
            self.row -= 1;
            self.clamp_col(buf);
        }
    }

    /// Move down one row (at most to the virtual row past the end),
    /// clamping the column to the new row.
    pub fn move_down(&mut self, buf: &TextBuffer) {
        if self.row < buf.len() {
            self.row += 1;
            self.clamp_col(buf);
        }
    }

    /// Jump to the start of the line.
    pub const fn line_home(&mut self) {
        self.col = 0;
    }

    /// Jump to the end of the line (no-op column-wise on the virtual row).
    pub fn line_end(&mut self, buf: &TextBuffer) {
        self.col = buf.row(self.row).map_or(0, Row::len);
    }

    /// Clamp the column into the current row and snap left off any
    /// continuation byte, restoring both cursor invariants after a row
    /// change.
    pub fn clamp_col(&mut self, buf: &TextBuffer) {
        let len = buf.row(self.row).map_or(0, Row::len);
        if self.col > len {
            self.col = len;
        }
        while self.col > 0 && self.col < len && self.on_continuation(buf) {
            self.col -= 1;
        }
    }

    /// True when the byte under the cursor is a UTF-8 continuation byte.
    fn on_continuation(&self, buf: &TextBuffer) -> bool {
        buf.row(self.row)
            .and_then(|r| r.raw().get(self.col))
            .is_some_and(|&b| is_continuation(b))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
