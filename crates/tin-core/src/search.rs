//! Incremental, wraparound substring search.
//!
//! Search runs over the **render forms** of the rows (tabs already
//! expanded), so what matches is what the user sees. Every keystroke of
//! the query re-runs the search; arrow keys steer the direction and hop
//! between matches.
//!
//! # Session shape
//!
//! [`begin`](SearchEngine::begin) snapshots the cursor and scroll state.
//! Each prompt keystroke calls [`refine`](SearchEngine::refine) with the
//! current query and a [`Step`] describing the key. Escape with nothing
//! to keep calls [`cancel`](SearchEngine::cancel), which restores the
//! snapshot; a confirmed match calls [`confirm`](SearchEngine::confirm)
//! and the cursor stays where the search put it.
//!
//! The scan visits every row exactly once per invocation, starting one
//! row past the last match in the current direction and wrapping
//! circularly through the whole buffer.

use crate::buffer::TextBuffer;
use crate::cursor::{Cursor, render_to_raw};
use crate::viewport::ViewPort;

/// What the latest prompt keystroke means for the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Right/Down: search forward from the last match.
    Forward,
    /// Left/Up: search backward from the last match.
    Backward,
    /// Any other key (the query changed): forward again, from scratch.
    Restart,
}

/// Saved cursor and scroll state for cancel-restore.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    cursor: Cursor,
    row_offset: usize,
    col_offset: usize,
}

/// Incremental search state: snapshot, direction, last-match memory.
#[derive(Debug, Default)]
pub struct SearchEngine {
    snapshot: Option<Snapshot>,
    /// Row of the most recent match, if any.
    last_match: Option<usize>,
    forward: bool,
}

impl SearchEngine {
    /// A quiescent engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            snapshot: None,
            last_match: None,
            forward: true,
        }
    }

    /// Start a search session: snapshot the cursor and scroll state and
    /// forget any previous session's matches.
    pub fn begin(&mut self, cursor: &Cursor, viewport: &ViewPort) {
        self.snapshot = Some(Snapshot {
            cursor: *cursor,
            row_offset: viewport.row_offset(),
            col_offset: viewport.col_offset(),
        });
        self.last_match = None;
        self.forward = true;
    }

    /// Re-run the search for the current query after a prompt keystroke.
    ///
    /// On a match: remembers the row, moves the cursor to the raw column
    /// of the match, and pushes the row offset past the end of the buffer
    /// so the next scroll recomputation lands the match row at the top of
    /// the window.
    pub fn refine(
        &mut self,
        buf: &TextBuffer,
        cursor: &mut Cursor,
        viewport: &mut ViewPort,
        query: &str,
        step: Step,
    ) {
        match step {
            Step::Forward => self.forward = true,
            Step::Backward => self.forward = false,
            Step::Restart => {
                self.last_match = None;
                self.forward = true;
            }
        }

        if query.is_empty() || buf.is_empty() {
            return;
        }

        // Reversing with no match to reverse from degrades to forward.
        if self.last_match.is_none() {
            self.forward = true;
        }

        let nrows = buf.len();
        let mut current = self.last_match;

        for _ in 0..nrows {
            // One circular step from the previous probe: forward wraps
            // the last row to row 0, backward wraps row 0 to the last
            // row, and "no match yet" starts at row 0.
            let probe = match (current, self.forward) {
                (None, _) => 0,
                (Some(m), true) => (m + 1) % nrows,
                (Some(m), false) => m.checked_sub(1).unwrap_or(nrows - 1),
            };
            current = Some(probe);

            let Some(row) = buf.row(probe) else { break };
            if let Some(offset) = find_substring(row.render(), query.as_bytes()) {
                self.last_match = Some(probe);
                cursor.move_to(probe, render_to_raw(row, offset));
                viewport.set_row_offset(nrows);
                return;
            }
        }
    }

    /// Abandon the session: restore the snapshotted cursor and scroll
    /// state. No-op if no session is active.
    pub fn cancel(&mut self, cursor: &mut Cursor, viewport: &mut ViewPort) {
        if let Some(snap) = self.snapshot.take() {
            *cursor = snap.cursor;
            viewport.set_row_offset(snap.row_offset);
            viewport.set_col_offset(snap.col_offset);
        }
        self.last_match = None;
        self.forward = true;
    }

    /// Keep the result: drop the snapshot, leaving the cursor at the
    /// match.
    pub fn confirm(&mut self) {
        self.snapshot = None;
        self.last_match = None;
        self.forward = true;
    }
}

/// Byte-wise substring search; returns the offset of the first match.
fn find_substring(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
