// SPDX-License-Identifier: MIT
//
// tin — TIN Isn't Nano. A small terminal text editor.
//
// This is the main binary that wires together the crates:
//
//   tin-term → raw mode, geometry, ANSI output, key decoding, event pump
//   tin-core → rows, buffer, cursor, viewport, renderer, edit ops, search
//
// The Editor struct owns all state and runs one strictly synchronous
// cycle per event:
//
//   refresh (gutter → scroll → compose frame → one write)
//   block on the event pump
//   key → edit/cursor/search dispatch, or resize → re-measure
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ status bar (reverse video)   │  ← 1 row
//   ├──────────────────────────────┤
//   │ gutter │ text area           │  ← rows - 2
//   ├──────────────────────────────┤
//   │ message bar / prompt line    │  ← 1 row
//   └──────────────────────────────┘
//
// Key bindings: ^X quit (with a countdown while dirty), ^S save (prompting
// for a name when unnamed), ^F incremental find, ^H backspace. The line
// prompt at the bottom collects save-as names and search queries; Escape
// cancels it without touching the buffer.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use tin_core::buffer::TextBuffer;
use tin_core::cursor::Cursor;
use tin_core::edit;
use tin_core::file;
use tin_core::render::Renderer;
use tin_core::search::{SearchEngine, Step};
use tin_core::status::StatusMessage;
use tin_core::viewport::ViewPort;

use tin_term::event::{Events, TermEvent};
use tin_term::input::{Key, KeyEvent, Modifiers};
use tin_term::terminal::Terminal;

/// Extra Ctrl-X presses required to quit with unsaved changes.
const QUIT_PRESSES: u32 = 3;

// ─── Event source ───────────────────────────────────────────────────────────

/// Where the editor's blocking loop gets its events: the live terminal
/// pump in production, a scripted sequence in tests. The prompt loop
/// nests on the same source, so a test script can drive a whole save-as
/// or find interaction.
trait EventSource {
    fn next_event(&mut self) -> io::Result<TermEvent>;
}

impl EventSource for Events {
    fn next_event(&mut self) -> io::Result<TermEvent> {
        self.next()
    }
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// What a handled key means for the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Keep running.
    Continue,
    /// Exit cleanly.
    Quit,
}

/// The editor: one explicit context value holding every piece of state,
/// passed by reference into each operation.
struct Editor {
    terminal: Terminal,
    buffer: TextBuffer,
    cursor: Cursor,
    viewport: ViewPort,
    renderer: Renderer,
    status: StatusMessage,
    search: SearchEngine,
    filename: Option<PathBuf>,
    quit_presses_left: u32,
}

impl Editor {
    /// An empty, unnamed editor.
    fn new() -> Self {
        Self {
            terminal: Terminal::new(),
            buffer: TextBuffer::new(),
            cursor: Cursor::new(),
            viewport: ViewPort::new(),
            renderer: Renderer::new(),
            status: StatusMessage::new(),
            search: SearchEngine::new(),
            filename: None,
            quit_presses_left: QUIT_PRESSES,
        }
    }

    /// An editor over the named file. A missing file is not an error —
    /// it starts an empty buffer that the first save will create.
    fn open(filename: Option<PathBuf>) -> io::Result<Self> {
        let mut editor = Self::new();
        if let Some(path) = filename {
            match file::load(&path) {
                Ok(lines) => editor.buffer = TextBuffer::from_lines(lines),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            editor.filename = Some(path);
        }
        Ok(editor)
    }

    // ── Main loop ───────────────────────────────────────────────

    /// Run until quit: refresh, block for an event, dispatch.
    fn run<E: EventSource>(&mut self, events: &mut E) -> io::Result<()> {
        loop {
            self.refresh_screen();
            match events.next_event()? {
                TermEvent::Key(key) => {
                    if self.handle_key(events, key)? == Action::Quit {
                        return Ok(());
                    }
                }
                TermEvent::Resize => self.handle_resize()?,
            }
        }
    }

    /// Draw one frame: fix the gutter for this refresh, scroll the
    /// cursor into view, compose, flush in a single write.
    fn refresh_screen(&mut self) {
        self.viewport.update_gutter(self.buffer.len());
        self.viewport.scroll(&self.cursor, &self.buffer);

        let name = self
            .filename
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        // A failed or short write abandons this frame; the next refresh
        // is the retry path.
        let _ = self.renderer.refresh(
            &self.buffer,
            &self.cursor,
            &self.viewport,
            &self.status,
            name.as_deref(),
        );
    }

    /// Re-measure after SIGWINCH. The next loop iteration redraws with
    /// the new geometry before any further input is handled.
    fn handle_resize(&mut self) -> io::Result<()> {
        let size = self.terminal.measure()?;
        self.viewport.set_size(size.rows, size.cols);
        Ok(())
    }

    // ── Key dispatch ────────────────────────────────────────────

    /// Handle one key. Ctrl-X feeds the quit countdown; every other key
    /// resets it.
    fn handle_key<E: EventSource>(
        &mut self,
        events: &mut E,
        key: KeyEvent,
    ) -> io::Result<Action> {
        if key.is_ctrl('x') {
            return Ok(self.request_quit());
        }

        if key.is_ctrl('s') {
            self.save_flow(events)?;
        } else if key.is_ctrl('f') {
            self.find_flow(events)?;
        } else {
            self.process_key(key);
        }

        self.quit_presses_left = QUIT_PRESSES;
        Ok(Action::Continue)
    }

    /// Everything except quit/save/find: movement and editing.
    fn process_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(Modifiers::CTRL) {
            match key.code {
                Key::Char('h') => edit::backspace(&mut self.buffer, &mut self.cursor),
                // ^L was "redraw"; every cycle redraws, so it's a no-op.
                _ => {}
            }
            return;
        }

        match key.code {
            Key::Enter => edit::newline(&mut self.buffer, &mut self.cursor),
            Key::Backspace => edit::backspace(&mut self.buffer, &mut self.cursor),
            Key::Delete => edit::delete_forward(&mut self.buffer, &mut self.cursor),
            Key::Up => self.cursor.move_up(&self.buffer),
            Key::Down => self.cursor.move_down(&self.buffer),
            Key::Left => self.cursor.move_left(&self.buffer),
            Key::Right => self.cursor.move_right(&self.buffer),
            Key::Home => self.cursor.line_home(),
            Key::End => self.cursor.line_end(&self.buffer),
            Key::PageUp => self.page_move(true),
            Key::PageDown => self.page_move(false),
            Key::Tab => edit::insert_char(&mut self.buffer, &mut self.cursor, '\t'),
            Key::Char(ch) => edit::insert_char(&mut self.buffer, &mut self.cursor, ch),
            Key::Escape => {}
        }
    }

    /// Jump the cursor to the window's top/bottom edge, then move a full
    /// window of rows.
    fn page_move(&mut self, up: bool) {
        let text_rows = self.viewport.text_rows();
        let target = if up {
            self.viewport.row_offset()
        } else {
            (self.viewport.row_offset() + text_rows.saturating_sub(1)).min(self.buffer.len())
        };
        self.cursor.move_to(target, self.cursor.col());
        self.cursor.clamp_col(&self.buffer);

        for _ in 0..text_rows {
            if up {
                self.cursor.move_up(&self.buffer);
            } else {
                self.cursor.move_down(&self.buffer);
            }
        }
    }

    // ── Quit ────────────────────────────────────────────────────

    /// A clean buffer quits immediately. A dirty one demands the full
    /// countdown of Ctrl-X presses, re-announced on each press.
    fn request_quit(&mut self) -> Action {
        if self.buffer.dirty() != 0 && self.quit_presses_left > 0 {
            let noun = if self.quit_presses_left == 1 {
                "time"
            } else {
                "times"
            };
            self.status.set(format!(
                "Unsaved changes in buffer! (press ^X {} more {} to quit)",
                self.quit_presses_left, noun
            ));
            self.quit_presses_left -= 1;
            return Action::Continue;
        }
        Action::Quit
    }

    // ── Save ────────────────────────────────────────────────────

    /// Ctrl-S: prompt for a name if the buffer has none, then save.
    fn save_flow<E: EventSource>(&mut self, events: &mut E) -> io::Result<()> {
        if self.filename.is_none() {
            match prompt(self, events, "save as: ", |_, _, _| {})? {
                Some(name) => self.filename = Some(PathBuf::from(name)),
                None => {
                    self.status.set("write aborted");
                    return Ok(());
                }
            }
        }
        self.save_file();
        Ok(())
    }

    /// Write the buffer to its file. Success resets the dirty counter;
    /// any failure reports to the status bar and leaves it unchanged so
    /// the user can retry.
    fn save_file(&mut self) {
        let Some(path) = self.filename.clone() else {
            return;
        };
        match file::save(&path, &self.buffer.to_bytes()) {
            Ok(n) => {
                self.status.set(format!("wrote {n} bytes"));
                self.buffer.mark_saved();
            }
            Err(e) => self.status.set(e.to_string()),
        }
    }

    // ── Find ────────────────────────────────────────────────────

    /// Ctrl-F: incremental search driven by the prompt. Arrow keys hop
    /// between matches; Escape (or confirming an empty query) restores
    /// the cursor and scroll state from before the search.
    fn find_flow<E: EventSource>(&mut self, events: &mut E) -> io::Result<()> {
        self.search.begin(&self.cursor, &self.viewport);

        let query = prompt(
            self,
            events,
            "find (next/prev with arrow keys): ",
            |ed, input, key| {
                let step = match key.code {
                    Key::Right | Key::Down => Step::Forward,
                    Key::Left | Key::Up => Step::Backward,
                    _ => Step::Restart,
                };
                ed.search
                    .refine(&ed.buffer, &mut ed.cursor, &mut ed.viewport, input, step);
            },
        )?;

        match query {
            Some(q) if !q.is_empty() => self.search.confirm(),
            _ => self.search.cancel(&mut self.cursor, &mut self.viewport),
        }
        Ok(())
    }
}

// ─── Line prompt ────────────────────────────────────────────────────────────

/// Collect one line of input on the message bar.
///
/// Printable ASCII appends, Backspace/Delete/Ctrl-H pop, Return confirms
/// (an empty confirmation counts as cancellation), Escape cancels. The
/// `on_key` callback runs after every other keystroke with the current
/// input — this is what drives incremental search. Cancellation leaves
/// the buffer untouched; the prompt only ever edits its own string.
fn prompt<E, F>(
    ed: &mut Editor,
    events: &mut E,
    label: &str,
    mut on_key: F,
) -> io::Result<Option<String>>
where
    E: EventSource,
    F: FnMut(&mut Editor, &str, KeyEvent),
{
    let mut input = String::new();

    loop {
        ed.status.set(format!("{label}{input}"));
        ed.refresh_screen();

        let key = match events.next_event()? {
            TermEvent::Key(key) => key,
            TermEvent::Resize => {
                ed.handle_resize()?;
                continue;
            }
        };

        match key.code {
            Key::Enter => {
                ed.status.clear();
                if input.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(input));
            }
            Key::Escape => {
                ed.status.clear();
                return Ok(None);
            }
            Key::Backspace | Key::Delete => {
                input.pop();
            }
            Key::Char('h') if key.modifiers.contains(Modifiers::CTRL) => {
                input.pop();
            }
            Key::Char(ch)
                if ch.is_ascii() && !ch.is_ascii_control() && key.modifiers.is_empty() =>
            {
                input.push(ch);
            }
            _ => {}
        }

        on_key(ed, &input, key);
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tin: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the file named on the command line, enter raw mode, probe the
/// geometry, and run the loop. Raw-mode and geometry failures are fatal;
/// the terminal guard restores cooked mode on the way out either way.
fn run() -> io::Result<()> {
    let filename = env::args_os().nth(1).map(PathBuf::from);
    let mut editor = Editor::open(filename)?;

    editor.terminal.enter()?;
    let size = editor.terminal.measure()?;
    editor.viewport.set_size(size.rows, size.cols);

    let mut events = Events::spawn();
    let result = editor.run(&mut events);

    events.shutdown();
    editor.terminal.leave()?;
    result
}

// ─── Tests ───────────────────────────────────────────────────────────────────
