//! Transient status message — a string with an expiry.
//!
//! The bottom bar shows short-lived feedback: save results, the quit
//! countdown, prompt text. A message is visible while its age is under
//! [`MESSAGE_TIMEOUT`]; after that the bar draws blank. Nothing clears
//! the message eagerly — every refresh just re-checks the age against
//! the clock.

use std::time::{Duration, Instant};

/// How long a status message stays visible.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(2);

/// The bottom-bar message and when it was set.
#[derive(Debug, Default)]
pub struct StatusMessage {
    text: String,
    set_at: Option<Instant>,
}

impl StatusMessage {
    /// An empty message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            set_at: None,
        }
    }

    /// Replace the message and restart its visibility window.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.set_at = Some(Instant::now());
    }

    /// Drop the message immediately.
    pub fn clear(&mut self) {
        self.text.clear();
        self.set_at = None;
    }

    /// The message text, if one is set and younger than the timeout.
    #[must_use]
    pub fn visible(&self) -> Option<&str> {
        self.visible_at(Instant::now())
    }

    /// Visibility check against an explicit clock reading.
    #[must_use]
    pub fn visible_at(&self, now: Instant) -> Option<&str> {
        let set_at = self.set_at?;
        if self.text.is_empty() {
            return None;
        }
        if now.duration_since(set_at) < MESSAGE_TIMEOUT {
            Some(&self.text)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
