use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info};

use crate::options::{format_duration, Mode, Options};
use crate::persist::Persister;
use crate::results::update_best_score;
use crate::session::Session;
use crate::storage::{Data, Preferences};
use crate::textwrap::{text_width_for, MAX_VISIBLE_LINES};

/// How long option change notices stay in the footer
pub const MESSAGE_TTL: Duration = Duration::from_secs(2);

/// What a key press did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Something visible changed and a redraw is due
    pub changed: bool,
    pub quit: bool,
}

impl KeyOutcome {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            changed: false,
            quit: true,
        }
    }
}

/// The session plus the persisted record it is scored against
pub struct App {
    pub session: Session,
    data: Data,
    persister: Option<Persister>,
    was_finished: bool,
}

impl App {
    pub fn new(session: Session, data: Data, persister: Option<Persister>) -> Self {
        let was_finished = session.timer().finished;
        Self {
            session,
            data,
            persister,
            was_finished,
        }
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Restore the persisted preferences onto the session
    pub fn apply_preferences(&mut self) -> bool {
        let options = self.data.preferences.apply_to(*self.session.options());
        self.session.set_options(options)
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::default();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let finished = self.session.timer().finished;

        let changed = match key.code {
            KeyCode::Esc => return KeyOutcome::quit(),
            KeyCode::Char('c') if ctrl => return KeyOutcome::quit(),
            KeyCode::Char('r') if ctrl => self.restart(),
            KeyCode::Tab => self.restart(),
            KeyCode::Char('w') if ctrl => !finished && self.session.backspace_word(now),
            KeyCode::Backspace if ctrl || alt => !finished && self.session.backspace_word(now),
            KeyCode::Backspace => !finished && self.session.backspace(now),
            KeyCode::Char('p') if ctrl => self.change_options(now, Session::toggle_punctuation),
            KeyCode::Char('n') if ctrl => self.change_options(now, Session::toggle_numbers),
            KeyCode::Char('t') if ctrl => {
                self.change_options(now, |s| s.set_mode(s.options().mode.toggled()))
            }
            KeyCode::Char('d') if ctrl => self.change_options(now, Session::cycle_preset),
            KeyCode::Char(_) if ctrl => false,
            KeyCode::Up => self.session.scroll_review(-1),
            KeyCode::Down => self.session.scroll_review(1),
            KeyCode::PageUp => self.session.scroll_review(-(MAX_VISIBLE_LINES as isize)),
            KeyCode::PageDown => self.session.scroll_review(MAX_VISIBLE_LINES as isize),
            KeyCode::Home => self.session.review_top(),
            KeyCode::End => self.session.review_bottom(),
            KeyCode::Char('r' | 'R') if finished => self.restart(),
            KeyCode::Char(_) if finished => false,
            KeyCode::Char('\n' | '\t') => false,
            KeyCode::Char(c) => {
                self.session.start_timer(now);
                self.session.add_rune(c, now)
            }
            _ => false,
        };
        let synced = self.sync_persistence();
        KeyOutcome::changed(changed || synced)
    }

    pub fn on_tick(&mut self, now: Instant) -> bool {
        let changed = self.session.update(now);
        self.sync_persistence() || changed
    }

    /// Adapt the wrap width to a terminal of `width` columns
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let text_width = text_width_for(usize::from(width));
        debug!("resize to {width}x{height}, text width {text_width}");
        if text_width == self.session.text_width() {
            return false;
        }
        self.session.set_text_width(text_width);
        if self.session.timer().finished {
            self.session.init_review_start();
        }
        true
    }

    /// Queue writes for changed preferences and, once per finished session,
    /// settle the results and save a new best score. Returns whether the results
    /// just became visible.
    pub fn sync_persistence(&mut self) -> bool {
        let mut dirty = false;
        let prefs = Preferences::from(self.session.options());
        if prefs != self.data.preferences {
            self.data.preferences = prefs;
            dirty = true;
        }

        let finished = self.session.timer().finished;
        let just_finished = finished && !self.was_finished;
        self.was_finished = finished;
        if just_finished {
            dirty |= self.finish();
        }

        if dirty {
            self.save();
        }
        just_finished
    }

    /// Flush pending writes and stop the writer thread
    pub fn shutdown(&mut self) {
        if let Some(mut persister) = self.persister.take() {
            persister.close();
        }
    }

    /// Returns whether a new best score was recorded
    fn finish(&mut self) -> bool {
        let options: Options = *self.session.options();
        let previous = self.data.best_scores.get(&options.score_key()).copied();
        self.session.finalize_results(previous.as_ref());
        self.session.init_review_start();

        let stats = *self.session.stats();
        let timestamp = chrono::Utc::now().timestamp();
        let best = update_best_score(&mut self.data, &options, &stats, timestamp);
        info!(
            "session finished: {} wpm, {}% acc, new best: {best}",
            stats.wpm, stats.accuracy
        );
        best
    }

    fn restart(&mut self) -> bool {
        self.session.reset();
        self.was_finished = false;
        true
    }

    fn change_options(&mut self, now: Instant, change: impl FnOnce(&mut Session) -> bool) -> bool {
        if !change(&mut self.session) {
            return false;
        }
        self.was_finished = false;
        let notice = option_notice(self.session.options());
        self.session.set_message(notice, now, MESSAGE_TTL);
        true
    }

    fn save(&self) {
        if let Some(persister) = &self.persister {
            persister.save(self.data.clone());
        }
    }
}

fn option_notice(options: &Options) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let length = match options.mode {
        Mode::Time => format_duration(options.duration),
        Mode::Words => format!("{} words", options.word_count),
    };
    format!(
        "{} {}  punctuation {}  numbers {}",
        options.mode,
        length,
        on_off(options.punctuation),
        on_off(options.numbers)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BestScore, MemoryStore};
    use crate::words::Generator;
    use assert_matches::assert_matches;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn words_app(count: usize, store: &MemoryStore) -> App {
        let options = Options {
            mode: Mode::Words,
            word_count: count,
            ..Options::default()
        };
        let session = Session::new(options, Generator::from_seed(3));
        let mut app = App::new(session, Data::default(), Some(Persister::new(store.clone())));
        app.resize(80, 24);
        app
    }

    fn type_target(app: &mut App, now: Instant) {
        let target = app.session.text().target.clone();
        for c in target {
            app.handle_key(key(KeyCode::Char(c)), now);
        }
    }

    #[test]
    fn test_quit_keys() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        assert!(app.handle_key(key(KeyCode::Esc), now).quit);
        assert!(app.handle_key(ctrl('c'), now).quit);
        assert!(!app.handle_key(key(KeyCode::Char('c')), now).quit);
    }

    #[test]
    fn test_typing_starts_timer() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        let c = app.session.text().target[0];

        let outcome = app.handle_key(key(KeyCode::Char(c)), now);
        assert_matches!(outcome, KeyOutcome { changed: true, quit: false });
        assert!(app.session.timer().started);
        assert_eq!(app.session.timer().start, Some(now));
        assert_eq!(app.session.stats().correct, 1);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let mut ev = key(KeyCode::Char('a'));
        ev.kind = KeyEventKind::Release;
        assert_eq!(app.handle_key(ev, Instant::now()), KeyOutcome::default());
        assert!(!app.session.timer().started);
    }

    #[test]
    fn test_finish_records_best_once() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        type_target(&mut app, now);

        assert!(app.session.timer().finished);
        assert!(app.session.results().visible);
        assert!(!app.session.results().has_baseline);
        let key_name = app.session.options().score_key();
        let best = app.data().best_scores[&key_name];
        assert_eq!(best.wpm, app.session.stats().wpm);
        assert!(best.timestamp > 0);

        // further keys and ticks do not finish again
        assert!(!app.handle_key(key(KeyCode::Char('x')), now).changed);
        assert!(!app.on_tick(now));
        app.shutdown();
        assert_eq!(store.data().map(|d| d.best_scores.len()), Some(1));
    }

    #[test]
    fn test_finished_session_only_restarts_on_r() {
        let store = MemoryStore::default();
        let mut app = words_app(2, &store);
        let now = Instant::now();
        type_target(&mut app, now);
        let typed = app.session.text().typed.len();

        assert!(!app.handle_key(key(KeyCode::Backspace), now).changed);
        assert_eq!(app.session.text().typed.len(), typed);

        assert!(app.handle_key(key(KeyCode::Char('R')), now).changed);
        assert!(!app.session.timer().started);
        assert!(app.session.text().typed.is_empty());
        assert!(!app.session.results().visible);
    }

    #[test]
    fn test_second_run_compares_against_best() {
        let store = MemoryStore::default();
        let mut app = words_app(2, &store);
        let key_name = app.session.options().score_key();
        app.data.best_scores.insert(
            key_name,
            BestScore {
                wpm: 10_000,
                accuracy: 100,
                timestamp: 1,
            },
        );
        type_target(&mut app, Instant::now());

        let results = app.session.results();
        assert!(results.has_baseline);
        assert!(results.worse);
        assert_eq!(results.best_wpm, 10_000);
    }

    #[test]
    fn test_option_toggles_reset_and_save() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();

        assert!(app.handle_key(ctrl('p'), now).changed);
        assert!(app.session.options().punctuation);
        assert!(app.session.message().is_some_and(|m| m.contains("punctuation on")));

        assert!(app.handle_key(ctrl('t'), now).changed);
        assert_eq!(app.session.options().mode, Mode::Time);
        assert!(app.handle_key(ctrl('d'), now).changed);
        assert!(app.handle_key(ctrl('n'), now).changed);

        app.shutdown();
        let saved = store.data().unwrap().preferences;
        assert_eq!(saved.mode, "time");
        assert!(saved.punctuation && saved.numbers);
        assert_eq!(saved, Preferences::from(app.session.options()));
    }

    #[test]
    fn test_unchanged_preferences_are_not_saved_again() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        app.on_tick(now);
        app.on_tick(now);
        app.handle_key(key(KeyCode::Tab), now);
        app.shutdown();
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_finish_without_new_best_is_not_saved() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        // settle the preference write first
        app.on_tick(now);
        app.shutdown();
        assert_eq!(store.saves(), 1);

        let mut app = words_app(3, &store);
        app.data.preferences = Preferences::from(app.session.options());
        let key_name = app.session.options().score_key();
        app.data.best_scores.insert(
            key_name,
            BestScore {
                wpm: 100_000,
                accuracy: 100,
                timestamp: 1,
            },
        );
        type_target(&mut app, now);
        assert!(app.session.results().worse);
        app.shutdown();
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_apply_preferences() {
        let session = Session::new(Options::default(), Generator::from_seed(3));
        let data = Data {
            preferences: Preferences {
                mode: "words".into(),
                duration_seconds: 0,
                word_count: 25,
                punctuation: false,
                numbers: true,
            },
            ..Data::default()
        };
        let mut app = App::new(session, data, None);
        assert!(app.apply_preferences());
        let options = app.session.options();
        assert_eq!(options.mode, Mode::Words);
        assert_eq!(options.word_count, 25);
        assert_eq!(options.duration, Duration::from_secs(60));
        assert!(options.numbers);
    }

    #[test]
    fn test_word_delete_and_review_keys() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        let now = Instant::now();
        let first: Vec<char> = app.session.text().target.clone();
        let space = first.iter().position(|c| *c == ' ').unwrap();
        for c in &first[..=space] {
            app.handle_key(key(KeyCode::Char(*c)), now);
        }
        assert!(app.handle_key(ctrl('w'), now).changed);
        assert!(app.session.text().typed.is_empty());
        let alt_bs = KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT);
        assert!(!app.handle_key(alt_bs, now).changed);

        // review keys do nothing while typing
        assert!(!app.handle_key(key(KeyCode::End), now).changed);
        assert!(!app.handle_key(key(KeyCode::Down), now).changed);
    }

    #[test]
    fn test_resize_sets_text_width() {
        let store = MemoryStore::default();
        let mut app = words_app(3, &store);
        assert_eq!(app.session.text_width(), 72);
        assert!(!app.resize(80, 30));
        assert!(app.resize(200, 30));
        assert_eq!(app.session.text_width(), 90);
    }
}
