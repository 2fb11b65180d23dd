use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

use crate::options::{Mode, Options};
use crate::results::ResultsState;
use crate::stats::{Stats, WpmSampler};
use crate::textwrap::{Line, LineCache};
use crate::util::normalize_char;
use crate::words::Generator;

/// Words generated up front for a time-mode session
pub const INITIAL_WORD_COUNT: usize = 220;
/// Words appended whenever a time-mode session runs out of target text
pub const EXTEND_WORD_COUNT: usize = 80;
/// How long the on-screen keyboard keeps the last key lit
pub const KEY_HIGHLIGHT: Duration = Duration::from_millis(450);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    pub started: bool,
    pub running: bool,
    pub finished: bool,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    /// Whole seconds left in time mode
    pub remaining: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub target: Vec<char>,
    pub typed: Vec<char>,
}

/// A status line message shown until `until`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub until: Instant,
}

/// One typing test: target text, what has been typed so far, timing and
/// the statistics derived from them.
///
/// Every operation takes the current instant from the caller and none of
/// them fail; out of range requests are no-ops.
#[derive(Debug)]
pub struct Session {
    pub(crate) options: Options,
    pub(crate) timer: Timer,
    pub(crate) stats: Stats,
    pub(crate) text: Text,
    pub(crate) mistakes: HashMap<char, usize>,
    pub(crate) results: ResultsState,
    pub(crate) review_start: usize,
    pub(crate) text_width: usize,
    generator: Generator,
    sampler: WpmSampler,
    line_cache: LineCache,
    target_version: u64,
    last_derived_second: Option<u64>,
    message: Option<Message>,
    last_key: Option<(char, Instant)>,
}

impl Session {
    pub fn new(options: Options, generator: Generator) -> Self {
        let mut session = Self {
            options,
            timer: Timer::default(),
            stats: Stats::default(),
            text: Text::default(),
            mistakes: HashMap::new(),
            results: ResultsState::default(),
            review_start: 0,
            text_width: 0,
            generator,
            sampler: WpmSampler::default(),
            line_cache: LineCache::default(),
            target_version: 0,
            last_derived_second: None,
            message: None,
            last_key: None,
        };
        session.reset();
        session
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn mistakes(&self) -> &HashMap<char, usize> {
        &self.mistakes
    }

    pub fn results(&self) -> &ResultsState {
        &self.results
    }

    pub fn review_start(&self) -> usize {
        self.review_start
    }

    pub fn text_width(&self) -> usize {
        self.text_width
    }

    pub fn sampler(&self) -> &WpmSampler {
        &self.sampler
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    pub fn last_key(&self) -> Option<char> {
        self.last_key.map(|(c, _)| c)
    }

    /// Start over with fresh text and zeroed timer, counters and review state
    pub fn reset(&mut self) {
        let count = match self.options.mode {
            Mode::Words => self.options.word_count,
            Mode::Time => INITIAL_WORD_COUNT,
        };
        self.text.target = self.generator.build(count, &self.options);
        self.bump_target_version();
        self.text.typed.clear();
        self.timer = match self.options.mode {
            Mode::Words => Timer::default(),
            Mode::Time => Timer {
                remaining: self.options.duration,
                ..Timer::default()
            },
        };
        self.stats = Stats::default();
        self.results = ResultsState::default();
        self.reset_review();
        self.mistakes.clear();
        self.sampler.reset();
        self.last_derived_second = None;
        self.last_key = None;
        self.stats.recompute(None);
        debug!(
            "session reset: mode={} target_len={}",
            self.options.mode,
            self.text.target.len()
        );
    }

    /// Replace the options; any actual change resets the session
    pub fn set_options(&mut self, options: Options) -> bool {
        if options == self.options {
            return false;
        }
        self.options = options;
        self.reset();
        true
    }

    pub fn toggle_punctuation(&mut self) -> bool {
        let mut options = self.options;
        options.punctuation = !options.punctuation;
        self.set_options(options)
    }

    pub fn toggle_numbers(&mut self) -> bool {
        let mut options = self.options;
        options.numbers = !options.numbers;
        self.set_options(options)
    }

    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.set_options(Options {
            mode,
            ..self.options
        })
    }

    pub fn set_duration(&mut self, duration: Duration) -> bool {
        if duration.is_zero() {
            return false;
        }
        self.set_options(Options {
            duration,
            ..self.options
        })
    }

    pub fn set_word_count(&mut self, word_count: usize) -> bool {
        if word_count == 0 {
            return false;
        }
        self.set_options(Options {
            word_count,
            ..self.options
        })
    }

    /// Advance the duration (time mode) or word count (words mode) preset
    pub fn cycle_preset(&mut self) -> bool {
        self.set_options(self.options.with_next_preset())
    }

    /// Mark the session started at `now`. Later calls are ignored.
    pub fn start_timer(&mut self, now: Instant) {
        if self.timer.started {
            return;
        }
        self.timer.started = true;
        self.timer.running = true;
        self.timer.finished = false;
        self.timer.start = Some(now);
        if self.options.mode == Mode::Time {
            self.timer.end = Some(now + self.options.duration);
            self.timer.remaining = self.options.duration;
        }
        debug!("session started: mode={}", self.options.mode);
    }

    /// Scheduler tick: count the clock down, sample WPM once per second and
    /// expire transient UI state. Returns whether anything visible changed.
    pub fn update(&mut self, now: Instant) -> bool {
        let mut changed = false;
        let mut expired = false;

        if self.options.mode == Mode::Time && self.timer.started && self.timer.running {
            let remaining = self
                .timer
                .end
                .map_or(Duration::ZERO, |end| end.saturating_duration_since(now));
            if remaining.is_zero() {
                self.timer.remaining = Duration::ZERO;
                self.timer.running = false;
                self.timer.finished = true;
                expired = true;
                changed = true;
                debug!("session expired after {:?}", self.options.duration);
            } else {
                let remaining = Duration::from_secs(remaining.as_secs());
                if remaining != self.timer.remaining {
                    self.timer.remaining = remaining;
                    changed = true;
                }
            }
        }

        if let Some(elapsed) = self.elapsed_for_stats(now) {
            let second = elapsed.as_secs();
            if (expired || self.last_derived_second != Some(second)) && self.update_derived(now)
            {
                changed = true;
            }
        }

        if self.message.as_ref().is_some_and(|m| now > m.until) {
            self.message = None;
            changed = true;
        }

        if self
            .last_key
            .is_some_and(|(_, at)| now.saturating_duration_since(at) > KEY_HIGHLIGHT)
        {
            self.last_key = None;
            changed = true;
        }

        changed
    }

    /// Type one character at the cursor. Returns false when the input was
    /// refused because the session is over or words-mode text is exhausted.
    pub fn add_rune(&mut self, c: char, now: Instant) -> bool {
        if self.timer.finished {
            return false;
        }
        let idx = self.text.typed.len();
        self.ensure_target(idx + 1);
        let Some(&expected) = self.text.target.get(idx) else {
            return false;
        };

        self.text.typed.push(c);
        if c == expected {
            self.stats.correct += 1;
            self.stats.streak += 1;
        } else {
            self.stats.incorrect += 1;
            self.stats.streak = 0;
            *self.mistakes.entry(normalize_char(c)).or_insert(0) += 1;
        }
        self.last_key = Some((normalize_char(c), now));

        if self.options.mode == Mode::Words && self.text.typed.len() >= self.text.target.len() {
            self.timer.finished = true;
            self.timer.running = false;
            self.timer.end = Some(now);
            debug!("session complete: {} chars", self.text.typed.len());
        }
        self.update_derived(now);
        true
    }

    /// Remove the last typed character
    pub fn backspace(&mut self, now: Instant) -> bool {
        let len = self.text.typed.len();
        if len == 0 {
            return false;
        }
        self.remove_typed_from(len - 1);
        self.update_derived(now);
        true
    }

    /// Remove trailing spaces and then the word before them
    pub fn backspace_word(&mut self, now: Instant) -> bool {
        let typed = &self.text.typed;
        let end = typed.len();
        let mut start = end;
        while start > 0 && typed[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && typed[start - 1] != ' ' {
            start -= 1;
        }
        if start == end {
            return false;
        }
        self.remove_typed_from(start);
        self.update_derived(now);
        true
    }

    /// Recompute accuracy and WPM, sampling WPM for consistency.
    /// Returns whether a shown value changed.
    pub fn update_derived(&mut self, now: Instant) -> bool {
        let elapsed = self.elapsed_for_stats(now);
        self.last_derived_second = elapsed.map(|e| e.as_secs());
        let changed = self.stats.recompute(elapsed);
        if let Some(elapsed) = elapsed {
            self.sampler.record(elapsed, self.stats.wpm);
        }
        changed
    }

    pub fn set_message(&mut self, text: impl Into<String>, now: Instant, ttl: Duration) {
        self.message = Some(Message {
            text: text.into(),
            until: now + ttl,
        });
    }

    /// Target words not yet reached by the cursor, words mode only
    pub fn words_left(&self) -> usize {
        if self.options.mode != Mode::Words {
            return 0;
        }
        let idx = self.text.typed.len().min(self.text.target.len());
        let rest = &self.text.target[idx..];
        rest.iter()
            .enumerate()
            .filter(|&(i, c)| *c != ' ' && (i == 0 || rest[i - 1] == ' '))
            .count()
    }

    /// Column budget used for wrapping; changing it invalidates cached lines
    pub fn set_text_width(&mut self, width: usize) {
        self.text_width = width;
    }

    /// Wrapped lines for the current target and width, rebuilt only when stale
    pub fn lines(&mut self) -> &[Line] {
        self.line_cache
            .lines(&self.text.target, self.text_width, self.target_version)
    }

    /// Cached lines if they match the current target and width. Callers that
    /// only hold `&self` refresh first with [`Session::lines`].
    pub fn cached_lines(&self) -> &[Line] {
        self.line_cache
            .get(self.text_width, self.target_version)
            .unwrap_or(&[])
    }

    /// Time the statistics are computed over: live while running, frozen
    /// once finished, and never below one second. `None` before the start.
    pub fn elapsed_for_stats(&self, now: Instant) -> Option<Duration> {
        let start = self.timer.start?;
        let mut elapsed = now.saturating_duration_since(start);
        if self.timer.finished {
            match (self.options.mode, self.timer.end) {
                (Mode::Time, _) => elapsed = self.options.duration,
                (Mode::Words, Some(end)) => elapsed = end.saturating_duration_since(start),
                (Mode::Words, None) => {}
            }
        }
        Some(elapsed.max(crate::stats::MIN_ELAPSED))
    }

    fn ensure_target(&mut self, min_len: usize) {
        if self.text.target.len() >= min_len || self.options.mode == Mode::Words {
            return;
        }
        self.generator
            .extend(&mut self.text.target, EXTEND_WORD_COUNT, &self.options);
        self.bump_target_version();
    }

    fn bump_target_version(&mut self) {
        self.target_version += 1;
    }

    /// Drop typed characters from `start` on, undoing their counter contributions
    fn remove_typed_from(&mut self, start: usize) {
        if start >= self.text.typed.len() {
            return;
        }
        for (typed, expected) in self.text.typed[start..]
            .iter()
            .zip(&self.text.target[start..])
        {
            if typed == expected {
                self.stats.correct = self.stats.correct.saturating_sub(1);
            } else {
                self.stats.incorrect = self.stats.incorrect.saturating_sub(1);
            }
        }
        self.text.typed.truncate(start);
        self.recalculate_streak();
    }

    fn recalculate_streak(&mut self) {
        self.stats.streak = self
            .text
            .typed
            .iter()
            .zip(&self.text.target)
            .rev()
            .take_while(|(typed, expected)| typed == expected)
            .count();
    }
}
