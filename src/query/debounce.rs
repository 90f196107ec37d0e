use std::time::Duration;
use tokio::time::Instant;

/// Two-stage search input: the raw text follows every keystroke, the
/// committed text only changes after `quiet_period` without typing.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    quiet_period: Duration,
    raw: String,
    last_input_at: Option<Instant>,
}

impl SearchDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            raw: String::new(),
            last_input_at: None,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    pub fn input(&mut self, text: &str, now: Instant) {
        self.raw = text.to_string();
        self.last_input_at = Some(now);
    }

    /// When the pending input becomes committable, if anything is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_input_at.map(|at| at + self.quiet_period)
    }

    /// Hands out the pending text once its quiet period has elapsed.
    /// Returns `None` while typing is still in progress or nothing is pending.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_input_at = None;
        Some(self.raw.clone())
    }

    /// Drops pending input and sets the raw text to `text`.
    pub fn reset_to(&mut self, text: &str) {
        self.raw = text.to_string();
        self.last_input_at = None;
    }
}
