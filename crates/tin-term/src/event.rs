// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event pump — one blocking call per editor cycle.
//
// The editor's main loop is strictly synchronous: draw a frame, block for
// the next event, handle it, repeat. This module supplies the blocking
// call. [`Events::next`] waits on the stdin byte channel and surfaces two
// kinds of events:
//
//   Key    — one decoded keypress (via the input parser)
//   Resize — the terminal geometry changed since the last call
//
// # Resize handling
//
// SIGWINCH arrives asynchronously, possibly while a frame write is in
// flight. The signal handler therefore does exactly one async-signal-safe
// thing: store `true` into an atomic. `next()` checks the flag each time
// it wakes and converts it into a `Resize` event, so all geometry
// re-measurement and redrawing happens on the main thread, in order, like
// any other event. The blocking wait is effectively a race between the
// byte channel and the resize flag.
//
// # Escape sequence timeout
//
// A lone ESC byte is ambiguous: the Escape key, or the head of a CSI
// sequence. The channel receive uses a short timeout; when it fires with
// sequence bytes still pending, the parser flushes them as literal keys.
// The user experiences at most ~25ms of lag on a bare Escape press.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::input::{KeyEvent, Parser};
use crate::reader::StdinReader;

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler. Checked on every wake-up.
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only sets [`RESIZE_PENDING`]. Writing to an atomic is one
/// of the few operations permitted inside a signal handler.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {
    // No-op on non-unix platforms.
}

// ─── Events ─────────────────────────────────────────────────────────────────

/// One event delivered to the editor's main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    /// A decoded keypress.
    Key(KeyEvent),
    /// The terminal was resized; re-measure and redraw.
    Resize,
}

/// How long `recv_timeout` waits before resolving pending escape bytes.
const ESC_TIMEOUT: Duration = Duration::from_millis(25);

/// The event pump: background reader + key decoder + resize flag.
///
/// Create one with [`spawn`](Self::spawn) after entering raw mode, then
/// call [`next`](Self::next) once per cycle. `next` blocks until a key or
/// a resize is available.
pub struct Events {
    reader: StdinReader,
    rx: Receiver<Vec<u8>>,
    parser: Parser,
    /// Decoded keys not yet handed out (one chunk can decode to several).
    queue: VecDeque<KeyEvent>,
}

impl Events {
    /// Install the SIGWINCH handler and spawn the stdin reader.
    #[must_use]
    pub fn spawn() -> Self {
        install_sigwinch_handler();
        let (reader, rx) = StdinReader::spawn();
        Self {
            reader,
            rx,
            parser: Parser::new(),
            queue: VecDeque::new(),
        }
    }

    /// Block until the next event.
    ///
    /// A pending resize takes priority over queued keys so a redraw with
    /// fresh geometry happens before any more input is interpreted.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` when stdin closes (the reader thread has
    /// exited and no bytes remain).
    pub fn next(&mut self) -> io::Result<TermEvent> {
        loop {
            if RESIZE_PENDING.swap(false, Ordering::Relaxed) {
                return Ok(TermEvent::Resize);
            }

            if let Some(key) = self.queue.pop_front() {
                return Ok(TermEvent::Key(key));
            }

            match self.rx.recv_timeout(ESC_TIMEOUT) {
                Ok(bytes) => {
                    self.queue.extend(self.parser.advance(&bytes));
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Resolve a pending lone ESC (or partial sequence)
                    // into literal keys.
                    if self.parser.has_pending() {
                        self.queue.extend(self.parser.flush());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if self.parser.has_pending() {
                        self.queue.extend(self.parser.flush());
                        continue;
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stdin closed",
                    ));
                }
            }
        }
    }

    /// Stop the background reader thread. Also happens on drop.
    pub fn shutdown(&mut self) {
        self.reader.stop();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    /// One sequential test: `RESIZE_PENDING` is process-global, so the
    /// scenarios share a single `#[test]` rather than racing each other.
    #[test]
    fn pump_ordering_and_shutdown() {
        // Flag store/swap round trip.
        RESIZE_PENDING.store(true, Ordering::Relaxed);
        assert!(RESIZE_PENDING.swap(false, Ordering::Relaxed));
        assert!(!RESIZE_PENDING.load(Ordering::Relaxed));

        let mut events = Events::spawn();

        // A pending resize outranks queued keys, and the keys survive.
        events.queue.push_back(KeyEvent::plain(Key::Char('a')));
        events.queue.push_back(KeyEvent::plain(Key::Enter));
        RESIZE_PENDING.store(true, Ordering::Relaxed);
        assert_eq!(events.next().unwrap(), TermEvent::Resize);
        assert_eq!(
            events.next().unwrap(),
            TermEvent::Key(KeyEvent::plain(Key::Char('a')))
        );
        assert_eq!(
            events.next().unwrap(),
            TermEvent::Key(KeyEvent::plain(Key::Enter))
        );

        // With the reader stopped and nothing queued, next() reports EOF.
        events.shutdown();
        let err = events.next().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
