//! Edit operations — buffer mutations guided by the cursor.
//!
//! Each operation here is atomic with respect to the buffer invariants:
//! when it returns, the cursor addresses a character boundary, every
//! touched row's render form has been re-derived, and the dirty counter
//! reflects the change. (Allocation failure aborts the process, so a
//! half-applied mutation is never observable.)
//!
//! The operations are free functions over `(&mut TextBuffer, &mut Cursor)`;
//! neither type owns the other.

use crate::buffer::TextBuffer;
use crate::cursor::Cursor;
use crate::row::is_continuation;

/// Insert a character at the cursor and advance past it.
///
/// Multi-byte characters insert their UTF-8 bytes in sequence, the cursor
/// moving one byte at a time and landing after the whole sequence. Typing
/// on the virtual row past the last line first appends an empty row.
pub fn insert_char(buf: &mut TextBuffer, cursor: &mut Cursor, ch: char) {
    if cursor.row == buf.len() {
        buf.insert_row(buf.len(), Vec::new());
    }

    let mut encoded = [0u8; 4];
    for &byte in ch.encode_utf8(&mut encoded).as_bytes() {
        buf.insert_byte(cursor.row, cursor.col, byte);
        cursor.col += 1;
    }
}

/// Delete the character before the cursor.
///
/// A multi-byte sequence is removed as one user action: the continuation
/// bytes immediately preceding the cursor go first, then the lead byte.
/// At column 0 the current row is joined onto the previous one: its bytes
/// are spliced onto the previous row's end, the row is deleted, and the
/// cursor lands at the previous row's original length. At the very start
/// of the buffer (or on the virtual row) this is a no-op.
pub fn backspace(buf: &mut TextBuffer, cursor: &mut Cursor) {
    if cursor.col == 0 && cursor.row == 0 {
        return;
    }
    if cursor.row == buf.len() {
        return;
    }

    if cursor.col > 0 {
        let continuation_before = |buf: &TextBuffer, cursor: &Cursor| {
            buf.row(cursor.row)
                .and_then(|r| r.raw().get(cursor.col - 1))
                .is_some_and(|&b| is_continuation(b))
        };
        while continuation_before(buf, cursor) {
            buf.delete_byte(cursor.row, cursor.col - 1);
            cursor.col -= 1;
        }
        buf.delete_byte(cursor.row, cursor.col - 1);
        cursor.col -= 1;
    } else {
        let previous_len = buf.row(cursor.row - 1).map_or(0, crate::row::Row::len);
        let bytes = buf
            .row(cursor.row)
            .map_or_else(Vec::new, |r| r.raw().to_vec());
        buf.append_bytes(cursor.row - 1, &bytes);
        buf.delete_row(cursor.row);
        cursor.row -= 1;
        cursor.col = previous_len;
    }
}

/// Delete the character under the cursor (forward delete).
///
/// Implemented as a step right followed by a backspace, which also makes
/// forward delete at a line end join the next row up. At the very end of
/// the buffer there is nothing to delete.
pub fn delete_forward(buf: &mut TextBuffer, cursor: &mut Cursor) {
    cursor.move_right(buf);
    backspace(buf, cursor);
}

/// Split the current row at the cursor (the Return key).
///
/// At column 0 a fresh empty row is inserted above; otherwise the bytes
/// from the cursor onward move to a new row below and the current row is
/// truncated. Either way the cursor lands at column 0 of the next row.
pub fn newline(buf: &mut TextBuffer, cursor: &mut Cursor) {
    if cursor.col == 0 {
        buf.insert_row(cursor.row, Vec::new());
    } else if let Some(row) = buf.row(cursor.row) {
        let tail = row.raw()[cursor.col..].to_vec();
        buf.insert_row(cursor.row + 1, tail);
        buf.truncate_row(cursor.row, cursor.col);
    }
    cursor.row += 1;
    cursor.col = 0;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
