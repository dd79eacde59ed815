//! ViewPort — window geometry, scroll offsets, and the gutter.
//!
//! The viewport owns the mapping from buffer space to screen space: which
//! row is at the top of the window (`row_offset`), which render column is
//! at the left edge (`col_offset`), and how wide the line-number gutter
//! is. Two of the terminal's rows are reserved for the status bar and the
//! message bar, so the text area is `screen_rows - 2` tall; the text area
//! width is `screen_cols - gutter`.
//!
//! # Scroll invariant
//!
//! After [`scroll`](ViewPort::scroll), the cursor lies inside the window:
//!
//! ```text
//! row_offset <= cursor.row < row_offset + text_rows
//! col_offset <= render_col < col_offset + text_cols
//! ```
//!
//! A cursor above/left of the window pulls the offset back to it; below/
//! right pushes the offset so the cursor sits on the last visible row or
//! column.
//!
//! # Gutter timing
//!
//! The gutter width is derived from the row count and recomputed **once
//! per refresh**, via [`update_gutter`](ViewPort::update_gutter), before
//! scrolling and drawing. Row drawing and cursor placement both read that
//! single value; recomputing it mid-frame would let an edit that changes
//! the digit count desynchronize the drawn gutter from the cursor column.

use crate::buffer::TextBuffer;
use crate::cursor::Cursor;

/// Window geometry and scroll state.
#[derive(Debug, Clone, Default)]
pub struct ViewPort {
    /// First visible buffer row.
    row_offset: usize,
    /// First visible render column.
    col_offset: usize,
    /// Total terminal rows (including the two status lines).
    screen_rows: usize,
    /// Total terminal columns (including the gutter).
    screen_cols: usize,
    /// Line-number gutter width: digits plus one separator column.
    gutter: usize,
}

impl ViewPort {
    /// A zero-sized viewport; call [`set_size`](Self::set_size) before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            row_offset: 0,
            col_offset: 0,
            screen_rows: 0,
            screen_cols: 0,
            gutter: 0,
        }
    }

    // -- Geometry -----------------------------------------------------------

    /// Record the measured terminal size. Called at startup and on every
    /// resize event.
    pub const fn set_size(&mut self, rows: u16, cols: u16) {
        self.screen_rows = rows as usize;
        self.screen_cols = cols as usize;
    }

    /// Rows available for text (total minus status bar and message bar).
    #[inline]
    #[must_use]
    pub const fn text_rows(&self) -> usize {
        self.screen_rows.saturating_sub(2)
    }

    /// Columns available for text (total minus the gutter).
    #[inline]
    #[must_use]
    pub const fn text_cols(&self) -> usize {
        self.screen_cols.saturating_sub(self.gutter)
    }

    /// Current gutter width in columns.
    #[inline]
    #[must_use]
    pub const fn gutter(&self) -> usize {
        self.gutter
    }

    /// First visible buffer row.
    #[inline]
    #[must_use]
    pub const fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// First visible render column.
    #[inline]
    #[must_use]
    pub const fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// Set the vertical scroll position directly.
    pub const fn set_row_offset(&mut self, offset: usize) {
        self.row_offset = offset;
    }

    /// Set the horizontal scroll position directly.
    pub const fn set_col_offset(&mut self, offset: usize) {
        self.col_offset = offset;
    }

    // -- Gutter -------------------------------------------------------------

    /// Recompute the gutter width for `nrows` total rows: the decimal
    /// digit count of the row count, plus one separator column. Held
    /// fixed for the remainder of the refresh.
    pub fn update_gutter(&mut self, nrows: usize) {
        self.gutter = digits(nrows) + 1;
    }

    // -- Scrolling ----------------------------------------------------------

    /// Adjust the offsets so the cursor is inside the visible window.
    pub fn scroll(&mut self, cursor: &Cursor, buf: &TextBuffer) {
        let render_col = cursor.render_col(buf);

        // Vertical: pull up to the cursor row, or push down so the
        // cursor row is the last visible one.
        if cursor.row() < self.row_offset {
            self.row_offset = cursor.row();
        }
        if cursor.row() >= self.row_offset + self.text_rows() {
            self.row_offset = cursor.row() + 1 - self.text_rows();
        }

        // Horizontal, measured in render columns against the text width
        // left over after the gutter.
        if render_col < self.col_offset {
            self.col_offset = render_col;
        }
        if render_col >= self.col_offset + self.text_cols() {
            self.col_offset = render_col + 1 - self.text_cols();
        }
    }
}

/// Decimal digit count, with 0 counted as one digit.
fn digits(n: usize) -> usize {
    n.max(1).ilog10() as usize + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(lines: &[&str]) -> TextBuffer {
        TextBuffer::from_lines(lines.iter().map(|l| l.as_bytes().to_vec()))
    }

    fn viewport(rows: u16, cols: u16, nrows: usize) -> ViewPort {
        let mut vp = ViewPort::new();
        vp.set_size(rows, cols);
        vp.update_gutter(nrows);
        vp
    }

    // -- Geometry -----------------------------------------------------------

    #[test]
    fn text_area_excludes_status_lines_and_gutter() {
        let vp = viewport(24, 80, 5);
        assert_eq!(vp.text_rows(), 22);
        assert_eq!(vp.gutter(), 2); // 1 digit + separator
        assert_eq!(vp.text_cols(), 78);
    }

    #[test]
    fn tiny_terminal_saturates_to_zero() {
        let vp = viewport(1, 1, 5);
        assert_eq!(vp.text_rows(), 0);
        assert_eq!(vp.text_cols(), 0);
    }

    // -- Gutter width -------------------------------------------------------

    #[test]
    fn gutter_grows_with_row_count() {
        let mut vp = ViewPort::new();
        vp.update_gutter(0);
        assert_eq!(vp.gutter(), 2);
        vp.update_gutter(9);
        assert_eq!(vp.gutter(), 2);
        vp.update_gutter(10);
        assert_eq!(vp.gutter(), 3);
        vp.update_gutter(99);
        assert_eq!(vp.gutter(), 3);
        vp.update_gutter(100);
        assert_eq!(vp.gutter(), 4);
    }

    #[test]
    fn gutter_holds_between_updates() {
        // Scrolling does not touch the gutter; only update_gutter does.
        let buf = buffer(&["a", "b"]);
        let mut vp = viewport(24, 80, 9);
        assert_eq!(vp.gutter(), 2);
        vp.scroll(&Cursor::new(), &buf);
        assert_eq!(vp.gutter(), 2);
        vp.update_gutter(10);
        assert_eq!(vp.gutter(), 3);
    }

    // -- Vertical scrolling -------------------------------------------------

    #[test]
    fn cursor_above_window_pulls_offset_up() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let buf = buffer(&refs);
        let mut vp = viewport(12, 80, buf.len());
        vp.set_row_offset(20);

        let mut c = Cursor::new();
        c.move_to(5, 0);
        vp.scroll(&c, &buf);
        assert_eq!(vp.row_offset(), 5);
    }

    #[test]
    fn cursor_below_window_pushes_offset_down() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let buf = buffer(&refs);
        let mut vp = viewport(12, 80, buf.len()); // text_rows = 10

        let mut c = Cursor::new();
        c.move_to(30, 0);
        vp.scroll(&c, &buf);
        // Cursor row is the last visible row.
        assert_eq!(vp.row_offset(), 21);
        assert!(c.row() < vp.row_offset() + vp.text_rows());
    }

    #[test]
    fn cursor_inside_window_leaves_offset_alone() {
        let buf = buffer(&["a", "b", "c", "d"]);
        let mut vp = viewport(24, 80, buf.len());
        let mut c = Cursor::new();
        c.move_to(2, 0);
        vp.scroll(&c, &buf);
        assert_eq!(vp.row_offset(), 0);
    }

    // -- Horizontal scrolling -----------------------------------------------

    #[test]
    fn cursor_right_of_window_pushes_col_offset() {
        let long = "x".repeat(200);
        let buf = buffer(&[&long]);
        let mut vp = viewport(24, 80, buf.len()); // text_cols = 78

        let mut c = Cursor::new();
        c.move_to(0, 100);
        vp.scroll(&c, &buf);
        assert_eq!(vp.col_offset(), 100 + 1 - vp.text_cols());
    }

    #[test]
    fn cursor_left_of_window_pulls_col_offset() {
        let long = "x".repeat(200);
        let buf = buffer(&[&long]);
        let mut vp = viewport(24, 80, buf.len());
        vp.set_col_offset(50);

        let mut c = Cursor::new();
        c.move_to(0, 10);
        vp.scroll(&c, &buf);
        assert_eq!(vp.col_offset(), 10);
    }

    #[test]
    fn horizontal_scroll_uses_render_columns() {
        // A row of tabs: raw column 20 is render column 80, beyond the
        // 78-column text area, so the window must scroll.
        let tabs = "\t".repeat(30);
        let buf = buffer(&[&tabs]);
        let mut vp = viewport(24, 80, buf.len());

        let mut c = Cursor::new();
        c.move_to(0, 20);
        vp.scroll(&c, &buf);
        let render_col = c.render_col(&buf);
        assert_eq!(render_col, 80);
        assert!(render_col >= vp.col_offset());
        assert!(render_col < vp.col_offset() + vp.text_cols());
    }

    // -- Invariant sweep ----------------------------------------------------

    #[test]
    fn cursor_always_inside_window_after_scroll() {
        let lines: Vec<String> = (0..40)
            .map(|i| format!("{}{}", "\t".repeat(i % 4), "y".repeat(i * 3)))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let buf = buffer(&refs);
        let mut vp = viewport(10, 40, buf.len());

        let mut c = Cursor::new();
        for row in (0..buf.len()).step_by(3) {
            let len = buf.row(row).map_or(0, crate::row::Row::len);
            for col in [0, len / 2, len] {
                c.move_to(row, col);
                c.clamp_col(&buf);
                vp.scroll(&c, &buf);

                let render_col = c.render_col(&buf);
                assert!(vp.row_offset() <= c.row());
                assert!(c.row() < vp.row_offset() + vp.text_rows());
                assert!(vp.col_offset() <= render_col);
                assert!(render_col < vp.col_offset() + vp.text_cols());
            }
        }
    }
}
