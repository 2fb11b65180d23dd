use std::cmp::Ordering;

use log::debug;

use crate::options::Options;
use crate::session::Session;
use crate::stats::Stats;
use crate::storage::{BestScore, Data};

/// Snapshot of a finished session, compared against the stored best
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultsState {
    pub visible: bool,
    pub net_wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub consistency: u32,
    pub best_wpm: u32,
    pub best_accuracy: u32,
    pub has_baseline: bool,
    pub improved: bool,
    pub worse: bool,
}

/// WPM decides, accuracy breaks ties
pub fn compare(wpm: u32, accuracy: u32, best: &BestScore) -> Ordering {
    (wpm, accuracy).cmp(&(best.wpm, best.accuracy))
}

/// Build the results snapshot for `stats` against an optional previous best
pub fn evaluate(stats: &Stats, consistency: u32, previous: Option<&BestScore>) -> ResultsState {
    let mut results = ResultsState {
        visible: true,
        net_wpm: stats.wpm,
        raw_wpm: stats.raw_wpm,
        accuracy: stats.accuracy,
        consistency,
        best_wpm: stats.wpm,
        best_accuracy: stats.accuracy,
        has_baseline: previous.is_some(),
        improved: false,
        worse: false,
    };
    if let Some(best) = previous {
        match compare(stats.wpm, stats.accuracy, best) {
            Ordering::Greater => results.improved = true,
            Ordering::Less => {
                results.worse = true;
                results.best_wpm = best.wpm;
                results.best_accuracy = best.accuracy;
            }
            Ordering::Equal => {
                results.best_wpm = best.wpm;
                results.best_accuracy = best.accuracy;
            }
        }
    }
    results
}

/// Record `stats` as the best for `options` when it beats the stored one.
/// Returns whether `data` changed.
pub fn update_best_score(data: &mut Data, options: &Options, stats: &Stats, timestamp: i64) -> bool {
    let key = options.score_key();
    if let Some(current) = data.best_scores.get(&key) {
        if compare(stats.wpm, stats.accuracy, current) != Ordering::Greater {
            return false;
        }
    }
    debug!("new best for {key}: {} wpm {}%", stats.wpm, stats.accuracy);
    data.best_scores.insert(
        key,
        BestScore {
            wpm: stats.wpm,
            accuracy: stats.accuracy,
            timestamp,
        },
    );
    true
}

impl Session {
    /// Freeze the results of a finished session
    pub fn finalize_results(&mut self, previous: Option<&BestScore>) {
        self.results = evaluate(&self.stats, self.sampler().consistency(), previous);
    }
}
