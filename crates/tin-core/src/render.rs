//! Renderer — one escape-coded frame per refresh.
//!
//! The whole frame is assembled into an [`OutputBuffer`] and flushed to
//! the terminal in a single write, so a refresh is never visible half
//! drawn. Frame contents, in order:
//!
//! 1. hide-cursor, cursor-home
//! 2. top status bar (reverse video): dirty marker + filename on the
//!    left, `line R/N, col C/N` on the right
//! 3. one line per visible text row: red right-aligned line number, a
//!    separator space, the visible slice of the row's render form, then
//!    erase-to-end-of-line
//! 4. bottom message bar: the transient status text while it is younger
//!    than its timeout
//! 5. cursor-position escape, derived from the same gutter width the row
//!    drawing used
//! 6. show-cursor
//!
//! Rows past the end of the buffer draw a `~` marker; an empty buffer
//! centers a short welcome banner a third of the way down instead.
//!
//! Failure policy: if the final write errors or comes up short, the
//! frame is abandoned — the next refresh redraws everything, so there is
//! nothing to patch up.

use std::io::{self, Write};

use tin_term::ansi::{self, Color};
use tin_term::output::OutputBuffer;

use crate::buffer::TextBuffer;
use crate::cursor::Cursor;
use crate::status::StatusMessage;
use crate::viewport::ViewPort;

/// Welcome banner shown in an empty buffer.
const BANNER: [&str; 3] = [
    "TIN - TIN Isn't Nano",
    concat!("version ", env!("CARGO_PKG_VERSION")),
    "^X exit   ^S save   ^F find",
];

/// Longest filename prefix shown in the status bar.
const FILENAME_COLS: usize = 20;

/// Builds frames into a reusable buffer and flushes them to the terminal.
#[derive(Default)]
pub struct Renderer {
    out: OutputBuffer,
}

impl Renderer {
    /// A renderer with an empty frame buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: OutputBuffer::new(),
        }
    }

    /// Compose a frame and write it to stdout in one syscall.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal write fails; the caller skips the
    /// frame and the next scheduled refresh is the retry path.
    pub fn refresh(
        &mut self,
        buf: &TextBuffer,
        cursor: &Cursor,
        viewport: &ViewPort,
        status: &StatusMessage,
        filename: Option<&str>,
    ) -> io::Result<()> {
        self.compose(buf, cursor, viewport, status, filename)?;
        self.out.flush_stdout()
    }

    /// Assemble a complete frame into the internal buffer (without
    /// flushing). Exposed separately so tests can inspect frames.
    ///
    /// # Errors
    ///
    /// Write errors cannot actually occur against the in-memory buffer;
    /// the `io::Result` is the natural signature for composing via the
    /// `Write` trait.
    pub fn compose(
        &mut self,
        buf: &TextBuffer,
        cursor: &Cursor,
        viewport: &ViewPort,
        status: &StatusMessage,
        filename: Option<&str>,
    ) -> io::Result<()> {
        self.out.clear();

        ansi::cursor_hide(&mut self.out)?;
        ansi::cursor_home(&mut self.out)?;

        self.draw_status_bar(buf, cursor, viewport, filename)?;
        self.draw_rows(buf, viewport)?;
        self.draw_message_bar(viewport, status)?;
        self.place_cursor(buf, cursor, viewport)?;

        ansi::cursor_show(&mut self.out)?;
        Ok(())
    }

    /// The bytes of the most recently composed frame.
    #[must_use]
    pub fn frame_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    // -- Frame pieces -------------------------------------------------------

    /// Top bar: `[*] name` left, `line R/N, col C/N` right, reverse
    /// video, padded to the full terminal width.
    fn draw_status_bar(
        &mut self,
        buf: &TextBuffer,
        cursor: &Cursor,
        viewport: &ViewPort,
        filename: Option<&str>,
    ) -> io::Result<()> {
        let bar_len = viewport.text_cols() + viewport.gutter();

        let marker = if buf.dirty() == 0 { ' ' } else { '*' };
        let name: String = filename
            .unwrap_or("[New]")
            .chars()
            .take(FILENAME_COLS)
            .collect();
        let left = format!("[{marker}] {name}");

        let line = if buf.is_empty() { 0 } else { cursor.row() + 1 };
        let line_total = buf.len();
        let col = cursor.render_col(buf) + 1;
        let col_total = buf.row(cursor.row()).map_or(0, crate::row::Row::render_len);
        let right = format!("line {line}/{line_total}, col {col}/{col_total}");

        // Right field first, left field in whatever room remains.
        let right: String = right.chars().take(bar_len).collect();
        let left: String = left
            .chars()
            .take(bar_len.saturating_sub(right.chars().count()))
            .collect();
        let padding = bar_len
            .saturating_sub(left.chars().count())
            .saturating_sub(right.chars().count());

        ansi::reverse(&mut self.out)?;
        self.out.write_all(left.as_bytes())?;
        for _ in 0..padding {
            self.out.write_all(b" ")?;
        }
        self.out.write_all(right.as_bytes())?;
        ansi::reset(&mut self.out)?;
        self.out.write_all(b"\r\n")
    }

    /// The text area: gutter + render-form slice per visible row, `~`
    /// filler past the end, the welcome banner in an empty buffer.
    fn draw_rows(&mut self, buf: &TextBuffer, viewport: &ViewPort) -> io::Result<()> {
        let text_rows = viewport.text_rows();
        let banner_top = text_rows / 3;

        for y in 0..text_rows {
            let file_row = y + viewport.row_offset();

            if file_row >= buf.len() {
                if buf.is_empty() && y >= banner_top {
                    self.draw_banner_line(y - banner_top, viewport)?;
                } else {
                    self.out.write_all(b"~")?;
                }
            } else if let Some(row) = buf.row(file_row) {
                self.draw_gutter(file_row + 1, viewport)?;

                let start = viewport.col_offset().min(row.render_len());
                let end = (viewport.col_offset() + viewport.text_cols()).min(row.render_len());
                self.out.write_all(&row.render()[start..end])?;
            }

            ansi::erase_line(&mut self.out)?;
            self.out.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Right-aligned line number in the gutter color, then the separator
    /// space. Uses the viewport's per-refresh gutter width.
    fn draw_gutter(&mut self, number: usize, viewport: &ViewPort) -> io::Result<()> {
        let digits = viewport.gutter().saturating_sub(1);
        ansi::fg(&mut self.out, Color::Red)?;
        write!(self.out, "{number:>digits$}")?;
        ansi::reset(&mut self.out)?;
        self.out.write_all(b" ")
    }

    /// One centered welcome-banner line (or a bare `~` below the banner).
    fn draw_banner_line(&mut self, index: usize, viewport: &ViewPort) -> io::Result<()> {
        let Some(text) = BANNER.get(index) else {
            return self.out.write_all(b"~");
        };

        let width = viewport.text_cols();
        let shown: String = text.chars().take(width).collect();
        let mut padding = (width - shown.chars().count()) / 2;
        if padding > 0 {
            self.out.write_all(b"~")?;
            padding -= 1;
        }
        for _ in 0..padding {
            self.out.write_all(b" ")?;
        }
        self.out.write_all(shown.as_bytes())
    }

    /// Bottom bar: the transient message while fresh, blank otherwise.
    fn draw_message_bar(
        &mut self,
        viewport: &ViewPort,
        status: &StatusMessage,
    ) -> io::Result<()> {
        let bar_len = viewport.text_cols() + viewport.gutter();

        ansi::erase_line(&mut self.out)?;
        ansi::reverse(&mut self.out)?;

        let text: String = status
            .visible()
            .unwrap_or("")
            .chars()
            .take(bar_len)
            .collect();
        self.out.write_all(text.as_bytes())?;
        for _ in 0..bar_len.saturating_sub(text.chars().count()) {
            self.out.write_all(b" ")?;
        }
        ansi::reset(&mut self.out)
    }

    /// Park the hardware cursor on the cursor's screen cell: one row down
    /// for the status bar, gutter columns right of the text slice.
    fn place_cursor(
        &mut self,
        buf: &TextBuffer,
        cursor: &Cursor,
        viewport: &ViewPort,
    ) -> io::Result<()> {
        let screen_row = cursor.row().saturating_sub(viewport.row_offset()) + 1;
        let screen_col =
            cursor.render_col(buf).saturating_sub(viewport.col_offset()) + viewport.gutter();

        #[allow(clippy::cast_possible_truncation)] // Bounded by the u16 terminal size.
        let (row, col) = (screen_row as u16, screen_col as u16);
        ansi::cursor_to(&mut self.out, row, col)
    }
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

    /// Compose a frame for a 10x40 terminal and return it as a string.
    fn frame(lines: &[&str], cursor_pos: (usize, usize), filename: Option<&str>) -> String {
        let buf = buffer(lines);
        let mut cursor = Cursor::new();
        cursor.move_to(cursor_pos.0, cursor_pos.1);
        let mut vp = ViewPort::new();
        vp.set_size(10, 40);
        vp.update_gutter(buf.len());
        vp.scroll(&cursor, &buf);

        let mut renderer = Renderer::new();
        renderer
            .compose(&buf, &cursor, &vp, &StatusMessage::new(), filename)
            .unwrap();
        String::from_utf8_lossy(renderer.frame_bytes()).into_owned()
    }

    // -- Frame envelope -----------------------------------------------------

    #[test]
    fn frame_hides_cursor_first_and_shows_it_last() {
        let f = frame(&["hello"], (0, 0), None);
        assert!(f.starts_with("\x1b[?25l\x1b[H"));
        assert!(f.ends_with("\x1b[?25h"));
    }

    #[test]
    fn frame_erases_every_drawn_line() {
        let f = frame(&["a", "b"], (0, 0), None);
        // 8 text rows on a 10-row terminal, each followed by erase-line.
        assert_eq!(f.matches("\x1b[K\r\n").count(), 8);
    }

    // -- Status bar ---------------------------------------------------------

    #[test]
    fn status_bar_shows_filename_and_position() {
        let f = frame(&["hello"], (0, 3), Some("notes.txt"));
        assert!(f.contains("[ ] notes.txt"));
        assert!(f.contains("line 1/1, col 4/5"));
    }

    #[test]
    fn status_bar_unnamed_buffer() {
        let f = frame(&["x"], (0, 0), None);
        assert!(f.contains("[ ] [New]"));
    }

    #[test]
    fn status_bar_dirty_marker() {
        let mut buf = buffer(&["x"]);
        buf.insert_byte(0, 0, b'y');
        let cursor = Cursor::new();
        let mut vp = ViewPort::new();
        vp.set_size(10, 40);
        vp.update_gutter(buf.len());

        let mut renderer = Renderer::new();
        renderer
            .compose(&buf, &cursor, &vp, &StatusMessage::new(), Some("f"))
            .unwrap();
        let f = String::from_utf8_lossy(renderer.frame_bytes()).into_owned();
        assert!(f.contains("[*] f"));
    }

    #[test]
    fn status_bar_truncates_long_filename() {
        let long = "a".repeat(60);
        let f = frame(&["x"], (0, 0), Some(&long));
        assert!(f.contains(&format!("[ ] {}", "a".repeat(20))));
        assert!(!f.contains(&"a".repeat(21)));
    }

    #[test]
    fn status_bar_is_reverse_video() {
        let f = frame(&["x"], (0, 0), None);
        let bar_start = f.find("\x1b[7m").unwrap();
        let bar_end = f.find("\x1b[m").unwrap();
        assert!(bar_start < bar_end);
    }

    #[test]
    fn status_column_counts_render_width() {
        // Cursor after the tab: raw column 1, render column 4 → col 5/5.
        let f = frame(&["\tabcd"], (0, 1), None);
        assert!(f.contains("col 5/8"));
    }

    // -- Text rows ----------------------------------------------------------

    #[test]
    fn rows_carry_red_line_numbers() {
        let f = frame(&["alpha", "beta"], (0, 0), None);
        assert!(f.contains("\x1b[31m1\x1b[m alpha"));
        assert!(f.contains("\x1b[31m2\x1b[m beta"));
    }

    #[test]
    fn gutter_right_aligns_line_numbers() {
        let lines: Vec<String> = (0..12).map(|i| format!("l{i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let f = frame(&refs, (0, 0), None);
        // 12 rows → 2-digit gutter; row 1 is padded to width 2.
        assert!(f.contains("\x1b[31m 1\x1b[m l0"));
    }

    #[test]
    fn rows_past_the_end_show_tilde() {
        let f = frame(&["only"], (0, 0), None);
        assert!(f.contains("~\x1b[K"));
    }

    #[test]
    fn horizontal_slice_respects_col_offset() {
        let long = "x".repeat(100);
        // Cursor at the far end forces a column offset.
        let f = frame(&[&long], (0, 100), None);
        // The row output never exceeds the text width (38 cols on a
        // 40-col terminal with a 2-col gutter).
        assert!(!f.contains(&"x".repeat(39)));
        assert!(f.contains(&"x".repeat(37)));
    }

    // -- Welcome banner -----------------------------------------------------

    #[test]
    fn empty_buffer_shows_banner() {
        let f = frame(&[], (0, 0), None);
        assert!(f.contains("TIN - TIN Isn't Nano"));
        assert!(f.contains(concat!("version ", env!("CARGO_PKG_VERSION"))));
        assert!(f.contains("^X exit   ^S save   ^F find"));
    }

    #[test]
    fn banner_lines_start_with_tilde() {
        let f = frame(&[], (0, 0), None);
        let banner_line = f
            .lines()
            .find(|l| l.contains("TIN Isn't Nano"))
            .unwrap();
        assert!(banner_line.contains("~ "));
    }

    #[test]
    fn nonempty_buffer_has_no_banner() {
        let f = frame(&["text"], (0, 0), None);
        assert!(!f.contains("TIN Isn't Nano"));
    }

    // -- Message bar --------------------------------------------------------

    #[test]
    fn fresh_message_is_drawn() {
        let buf = buffer(&["x"]);
        let cursor = Cursor::new();
        let mut vp = ViewPort::new();
        vp.set_size(10, 40);
        vp.update_gutter(buf.len());
        let mut status = StatusMessage::new();
        status.set("wrote 2 bytes");

        let mut renderer = Renderer::new();
        renderer
            .compose(&buf, &cursor, &vp, &status, None)
            .unwrap();
        let f = String::from_utf8_lossy(renderer.frame_bytes()).into_owned();
        assert!(f.contains("wrote 2 bytes"));
    }

    // -- Cursor placement ---------------------------------------------------

    #[test]
    fn cursor_escape_accounts_for_status_bar_and_gutter() {
        // Cursor at (0,0): screen row 2 (1-indexed, below the status
        // bar), screen column gutter+1 = 3.
        let f = frame(&["hello"], (0, 0), None);
        assert!(f.contains("\x1b[2;3H"));
    }

    #[test]
    fn cursor_escape_tracks_render_column() {
        // After a tab, render column 4 → screen column 4+2+1 = 7.
        let f = frame(&["\thi"], (0, 1), None);
        assert!(f.contains("\x1b[2;7H"));
    }

    // -- Determinism --------------------------------------------------------

    #[test]
    fn identical_state_composes_identical_frames() {
        let buf = buffer(&["alpha", "beta"]);
        let mut cursor = Cursor::new();
        cursor.move_to(1, 2);
        let mut vp = ViewPort::new();
        vp.set_size(10, 40);
        vp.update_gutter(buf.len());
        vp.scroll(&cursor, &buf);
        let status = StatusMessage::new();

        let mut renderer = Renderer::new();
        renderer
            .compose(&buf, &cursor, &vp, &status, Some("f.txt"))
            .unwrap();
        let first = renderer.frame_bytes().to_vec();
        renderer
            .compose(&buf, &cursor, &vp, &status, Some("f.txt"))
            .unwrap();
        assert_eq!(first, renderer.frame_bytes());
    }
}
