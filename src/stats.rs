use std::time::Duration;

use crate::time_series::TimeSeriesPoint;
use crate::util::{round_half_up, std_dev};

/// Characters per "word" in the WPM convention
pub const CHARS_PER_WORD: f64 = 5.0;
/// Elapsed time is never taken below this, to keep WPM sane right after start
pub const MIN_ELAPSED: Duration = Duration::from_secs(1);

/// Live counters and the values derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub correct: usize,
    pub incorrect: usize,
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub streak: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            wpm: 0,
            raw_wpm: 0,
            accuracy: 100,
            streak: 0,
        }
    }
}

impl Stats {
    pub fn judged(&self) -> usize {
        self.correct + self.incorrect
    }

    /// Recompute accuracy and WPM. `elapsed` is `None` until the timer starts,
    /// which pins both WPM values to zero. Returns whether a shown value changed.
    pub fn recompute(&mut self, elapsed: Option<Duration>) -> bool {
        let accuracy = accuracy(self.correct, self.incorrect);
        let (wpm, raw_wpm) = match elapsed {
            Some(elapsed) => (
                words_per_minute(self.correct, elapsed),
                words_per_minute(self.judged(), elapsed),
            ),
            None => (0, 0),
        };
        let changed = accuracy != self.accuracy || wpm != self.wpm || raw_wpm != self.raw_wpm;
        self.accuracy = accuracy;
        self.wpm = wpm;
        self.raw_wpm = raw_wpm;
        changed
    }
}

/// Percentage of judged characters that were correct, 100 before any input
pub fn accuracy(correct: usize, incorrect: usize) -> u32 {
    let total = correct + incorrect;
    if total == 0 {
        return 100;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

/// `chars / 5` words over `elapsed` minutes, rounded half up
pub fn words_per_minute(chars: usize, elapsed: Duration) -> u32 {
    let minutes = elapsed.max(MIN_ELAPSED).as_secs_f64() / 60.0;
    round_half_up(chars as f64 / CHARS_PER_WORD / minutes)
}

/// Keeps at most one WPM sample per whole elapsed second
#[derive(Debug, Default, Clone)]
pub struct WpmSampler {
    last_second: Option<u64>,
    samples: Vec<TimeSeriesPoint>,
}

impl WpmSampler {
    pub fn reset(&mut self) {
        self.last_second = None;
        self.samples.clear();
    }

    /// Record `wpm` for the second `elapsed` falls in. Returns false when that
    /// second (or a later one) was already sampled.
    pub fn record(&mut self, elapsed: Duration, wpm: u32) -> bool {
        let second = elapsed.as_secs();
        if self.last_second.is_some_and(|last| second <= last) {
            return false;
        }
        self.last_second = Some(second);
        self.samples.push(TimeSeriesPoint::new(second, wpm));
        true
    }

    pub fn samples(&self) -> &[TimeSeriesPoint] {
        &self.samples
    }

    /// Population standard deviation of the sampled WPM, rounded; 0 with no samples
    pub fn consistency(&self) -> u32 {
        let values = self
            .samples
            .iter()
            .map(|p| f64::from(p.wpm))
            .collect::<Vec<_>>();
        std_dev(&values).map_or(0, round_half_up)
    }
}
