//! Time-paced, character-by-character reveal of a line body.
use std::time::Duration;

/// Reveal state for one line. Dropping or replacing it cancels the reveal.
#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    char_count: usize,
    revealed: usize,
    interval: Duration,
    elapsed: Duration,
}

impl Typewriter {
    /// Starts a reveal with the first character already visible.
    ///
    /// A zero interval reveals the whole text at once.
    pub fn start(text: impl Into<String>, interval: Duration) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        let revealed = if interval.is_zero() {
            char_count
        } else {
            char_count.min(1)
        };

        Self {
            text,
            char_count,
            revealed,
            interval,
            elapsed: Duration::ZERO,
        }
    }

    /// Advances the reveal by `delta`; returns whether more text became visible.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.is_finished() {
            return false;
        }

        self.elapsed += delta;
        let before = self.revealed;
        while self.elapsed >= self.interval && self.revealed < self.char_count {
            self.elapsed -= self.interval;
            self.revealed += 1;
        }
        self.revealed != before
    }

    /// Skips straight to the full text.
    pub fn finish(&mut self) {
        self.revealed = self.char_count;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_finished(&self) -> bool {
        self.revealed >= self.char_count
    }

    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.revealed) {
            Some((byte_index, _)) => &self.text[..byte_index],
            None => &self.text,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }
}
