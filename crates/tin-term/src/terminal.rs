// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, geometry, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, poll, and raw fd reads/writes.
// These are the standard POSIX interfaces for terminal control — there is
// no safe alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios
// and guarantees cleanup on drop — even if the editor panics mid-frame.
//
// The panic hook deserves special mention: it bypasses Rust's stdout lock
// entirely, writing a pre-built restore sequence directly to fd 1. This
// prevents deadlock if the panic happened while holding the stdout lock
// (common during frame rendering). One raw write, everything restored,
// then the original panic handler prints its message to a working terminal.
//
// Why not crossterm? A tiny editor that emits a dozen escape sequences
// doesn't need an abstraction layer; direct termios control keeps every
// terminal interaction visible in this one file.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails; callers
/// fall back to the cursor-report probe in that case.
#[cfg(unix)]
#[must_use]
pub fn window_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn window_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Restore sequence for emergency use: reset SGR attributes, show the
/// cursor, clear the screen, cursor to the top-left corner.
///
/// The clear comes before the cursor-home so the panic message prints on
/// a blank screen instead of over frame leftovers.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[m\x1b[?25h\x1b[2J\x1b[H";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. Our hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler so the error prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Cursor-report parsing ──────────────────────────────────────────────────

/// Parse a cursor position report: `ESC [ rows ; cols R` (1-indexed).
///
/// Returns `None` for anything that isn't a complete, well-formed report.
/// Split out as a pure function so the fallback probe's only untestable
/// part is the actual fd traffic.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let rest = reply.strip_prefix(b"\x1b[")?;
    let rest = rest.strip_suffix(b"R")?;
    let sep = rest.iter().position(|&b| b == b';')?;
    let rows = parse_u16(&rest[..sep])?;
    let cols = parse_u16(&rest[sep + 1..])?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(Size { rows, cols })
}

/// Parse a non-empty ASCII decimal number, rejecting overflow.
fn parse_u16(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    let mut n: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n
            .checked_mul(10)?
            .checked_add(u16::from(b - b'0'))?;
    }
    Some(n)
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch to raw mode. The terminal is
/// automatically restored when the handle is dropped — even on panic.
///
/// # Example
///
/// ```no_run
/// use tin_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// let size = term.measure()?;
/// // ... render frames, handle input ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is active.
    active: bool,
}

impl Terminal {
    /// Create an inactive terminal handle.
    ///
    /// Does **not** enter raw mode — call [`enter`](Self::enter) for that.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether raw mode is currently active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode: no echo, no line buffering, no signal keys, no
    /// output post-processing. Installs the panic hook on first use.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios configuration fails. That error is
    /// fatal to the editor — continuing without raw mode would leave input
    /// half-cooked.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        self.active = true;
        Ok(())
    }

    /// Leave raw mode and restore the terminal: reset attributes, show the
    /// cursor, clear the screen, then restore the original termios.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or the termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            ansi::reset(&mut lock)?;
            ansi::cursor_show(&mut lock)?;
            ansi::clear_screen(&mut lock)?;
            ansi::cursor_home(&mut lock)?;
            lock.flush()?;
        }

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    /// Measure the terminal, preferring `ioctl(TIOCGWINSZ)`.
    ///
    /// When the ioctl is unavailable, falls back to parking the cursor at
    /// the bottom-right corner (large cursor-forward + cursor-down moves,
    /// which the terminal clamps at the edges) and asking the terminal to
    /// report where the cursor ended up. Only meaningful in raw mode — the
    /// report arrives as unechoed input bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if both the ioctl and the probe fail. Geometry is
    /// load-bearing for every frame, so the caller treats this as fatal.
    pub fn measure(&self) -> io::Result<Size> {
        if let Some(size) = window_size() {
            return Ok(size);
        }
        self.probe_size()
    }

    /// The bottom-right-corner fallback probe.
    #[cfg(unix)]
    fn probe_size(&self) -> io::Result<Size> {
        {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            ansi::cursor_forward(&mut lock, 999)?;
            ansi::cursor_down(&mut lock, 999)?;
            ansi::query_cursor_position(&mut lock)?;
            lock.flush()?;
        }

        // Read the report byte by byte until the terminating 'R'. Each
        // byte waits on poll() so a silent terminal fails the probe
        // instead of hanging the editor at startup.
        let mut reply = Vec::with_capacity(16);
        loop {
            let byte = read_byte_timeout(PROBE_TIMEOUT_MS)?;
            reply.push(byte);
            if byte == b'R' {
                break;
            }
            if reply.len() > 32 {
                break; // Garbage stream, not a report.
            }
        }

        parse_cursor_report(&reply)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "bad cursor report"))
    }

    #[cfg(not(unix))]
    fn probe_size(&self) -> io::Result<Size> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no terminal size probe on this platform",
        ))
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // Raw mode: disable all line processing.
            termios.c_iflag &=
                !(libc::BRKINT | libc::INPCK | libc::ISTRIP | libc::ICRNL | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte is
            // available. The reader thread polls before reading, so it
            // never actually parks in read() without data.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

/// How long the geometry probe waits for each reply byte (milliseconds).
const PROBE_TIMEOUT_MS: i32 = 200;

/// Read one byte from stdin, waiting at most `timeout_ms` for it.
#[cfg(unix)]
fn read_byte_timeout(timeout_ms: i32) -> io::Result<u8> {
    use std::os::unix::io::AsRawFd;

    let fd = io::stdin().as_raw_fd();

    let ready = unsafe {
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        libc::poll(&raw mut pfd, 1, timeout_ms)
    };
    if ready <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "no cursor report from terminal",
        ));
    }

    let mut byte = 0u8;
    let n = unsafe { libc::read(fd, (&raw mut byte).cast(), 1) };
    if n != 1 {
        return Err(io::Error::last_os_error());
    }
    Ok(byte)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
