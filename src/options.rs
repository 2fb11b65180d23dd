use std::time::Duration;

use clap::ValueEnum;

/// Whether a session ends on a clock or on a fixed amount of text
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Time,
    Words,
}

impl Mode {
    /// Parse the persisted form. Anything unrecognised falls back to `Time`.
    pub fn from_name(value: &str) -> Self {
        match value {
            "words" => Mode::Words,
            _ => Mode::Time,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Time => Mode::Words,
            Mode::Words => Mode::Time,
        }
    }
}

/// Session options. Any change forces a full reset of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub punctuation: bool,
    pub numbers: bool,
    pub mode: Mode,
    pub duration: Duration,
    pub word_count: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            punctuation: false,
            numbers: false,
            mode: Mode::Time,
            duration: Duration::from_secs(60),
            word_count: 50,
        }
    }
}

/// One selector slot: a duration for time mode paired with a word count for words mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub duration: Duration,
    pub word_count: usize,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        duration: Duration::from_secs(30),
        word_count: 10,
    },
    Preset {
        duration: Duration::from_secs(60),
        word_count: 25,
    },
    Preset {
        duration: Duration::from_secs(10 * 60),
        word_count: 50,
    },
    Preset {
        duration: Duration::from_secs(30 * 60),
        word_count: 100,
    },
];

impl Preset {
    pub fn label(&self, mode: Mode) -> String {
        match mode {
            Mode::Words => self.word_count.to_string(),
            Mode::Time => format_duration(self.duration),
        }
    }
}

impl Options {
    /// Index of the preset matching the current mode's length setting, if any
    pub fn preset_index(&self) -> Option<usize> {
        PRESETS.iter().position(|p| match self.mode {
            Mode::Time => p.duration == self.duration,
            Mode::Words => p.word_count == self.word_count,
        })
    }

    /// Options with the length setting advanced to the next preset slot (wrapping)
    pub fn with_next_preset(&self) -> Self {
        let next = self
            .preset_index()
            .map_or(0, |idx| (idx + 1) % PRESETS.len());
        let preset = PRESETS[next];
        let mut options = *self;
        match self.mode {
            Mode::Time => options.duration = preset.duration,
            Mode::Words => options.word_count = preset.word_count,
        }
        options
    }

    /// Key used to look up the persisted best score for this option combination
    pub fn score_key(&self) -> String {
        match self.mode {
            Mode::Words => format!(
                "words:{}|punct={}|numbers={}",
                self.word_count, self.punctuation, self.numbers
            ),
            Mode::Time => format!(
                "time:{}s|punct={}|numbers={}",
                self.duration.as_secs(),
                self.punctuation,
                self.numbers
            ),
        }
    }
}

/// `45s`, `1m`, `10m`, `1m30s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s}s"),
    }
}
