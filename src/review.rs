use crate::session::Session;
use crate::textwrap::{default_start_line, max_start_line};

/// `current` moved by `delta` lines and clamped to the scrollable range.
/// `None` when the clamped position equals `current`.
pub fn scrolled(current: usize, delta: isize, line_count: usize) -> Option<usize> {
    let target = current
        .saturating_add_signed(delta)
        .min(max_start_line(line_count));
    (target != current).then_some(target)
}

// Post-session navigation over the wrapped target. Everything here is a
// no-op until the timer has finished.
impl Session {
    pub fn reset_review(&mut self) {
        self.review_start = 0;
    }

    /// Open review where typing stopped, with the usual line of context above
    pub fn init_review_start(&mut self) {
        let cursor = self.text.typed.len();
        let start = default_start_line(self.lines(), cursor);
        self.review_start = start;
    }

    pub fn scroll_review(&mut self, delta: isize) -> bool {
        if !self.timer.finished {
            return false;
        }
        let line_count = self.lines().len();
        if line_count == 0 {
            return false;
        }
        match scrolled(self.review_start, delta, line_count) {
            Some(start) => {
                self.review_start = start;
                true
            }
            None => false,
        }
    }

    pub fn review_top(&mut self) -> bool {
        if !self.timer.finished || self.review_start == 0 {
            return false;
        }
        self.review_start = 0;
        true
    }

    pub fn review_bottom(&mut self) -> bool {
        if !self.timer.finished {
            return false;
        }
        let line_count = self.lines().len();
        if line_count == 0 {
            return false;
        }
        let bottom = max_start_line(line_count);
        if self.review_start == bottom {
            return false;
        }
        self.review_start = bottom;
        true
    }
}
