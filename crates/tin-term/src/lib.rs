// SPDX-License-Identifier: MIT
//
// tin-term — terminal layer for tin.
//
// Direct terminal control via ANSI escape sequences and raw termios: raw
// mode with RAII and panic-safe restore, geometry probing with the
// cursor-report fallback, byte-level key decoding, a background stdin
// reader, and whole-frame buffered output flushed in one write.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control. The editor emits a
// small, fixed escape vocabulary; every byte sent to the terminal is
// visible in `ansi.rs`.

pub mod ansi;
pub mod event;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;
