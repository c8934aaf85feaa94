//! Running accumulators and the speed/accuracy formulas.
//!
//! Accounting policy for `total_typed_chars`: every character entry adds one,
//! every deletion that actually removes a character subtracts one, and word
//! boundaries leave it untouched. It therefore tracks the net keystrokes still
//! reflected in typed content. `correct_chars` only grows, on commit.

use crate::classifier::match_len;

/// Characters per word in the WPM convention.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Live WPM at `t` seconds into the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub correct_chars: usize,
    pub total_typed_chars: usize,
    /// live WPM sampled at each commit and at the end of the session
    pub wpm_samples: Vec<TimeSeriesPoint>,
}

impl Stats {
    /// Score a committed token and return how many of its positions matched.
    pub fn on_word_committed(&mut self, target: &str, typed: &str) -> usize {
        let matched = match_len(target, typed);
        self.correct_chars += matched;
        matched
    }

    pub fn on_char_entered(&mut self) {
        self.total_typed_chars += 1;
    }

    pub fn on_char_deleted(&mut self) {
        self.total_typed_chars = self.total_typed_chars.saturating_sub(1);
    }

    pub fn wpm(&self, elapsed_ms: u64) -> u32 {
        words_per_minute(self.correct_chars, elapsed_ms)
    }

    pub fn accuracy(&self) -> u32 {
        accuracy(self.correct_chars, self.total_typed_chars)
    }

    pub fn record_sample(&mut self, elapsed_ms: u64) {
        let t = elapsed_ms as f64 / 1000.0;
        let wpm = self.wpm(elapsed_ms) as f64;
        match self.wpm_samples.last_mut() {
            Some(last) if last.t == t => last.wpm = wpm,
            _ => self.wpm_samples.push(TimeSeriesPoint::new(t, wpm)),
        }
    }

    /// Spread of the sampled WPM values; 0 with fewer than two samples.
    pub fn consistency(&self) -> f64 {
        let n = self.wpm_samples.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.wpm_samples.iter().map(|p| p.wpm).sum::<f64>() / n as f64;
        let variance = self
            .wpm_samples
            .iter()
            .map(|p| (p.wpm - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        variance.sqrt()
    }
}

/// `round((correct / 5) / minutes)`, or 0 before any time has elapsed.
pub fn words_per_minute(correct_chars: usize, elapsed_ms: u64) -> u32 {
    if elapsed_ms == 0 {
        return 0;
    }
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    ((correct_chars as f64 / CHARS_PER_WORD) / elapsed_minutes).round() as u32
}

/// Percentage of typed characters that were correct, clamped to `0..=100`.
pub fn accuracy(correct_chars: usize, total_typed_chars: usize) -> u32 {
    if total_typed_chars == 0 {
        return 100;
    }
    let pct = (correct_chars as f64 / total_typed_chars as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}
