use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::debug;

/// Bound on terminal events buffered ahead of the UI thread
pub const EVENT_BUFFER: usize = 32;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    /// The event source is gone; the loop should stop
    Closed,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source: a reader thread forwarding crossterm events
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(EVENT_BUFFER);
        std::thread::spawn(move || read_loop(tx));
        Self { rx }
    }
}

fn read_loop(tx: SyncSender<AppEvent>) {
    loop {
        let ev = match event::read() {
            Ok(CtEvent::Key(key)) => AppEvent::Key(key),
            Ok(CtEvent::Resize(w, h)) => AppEvent::Resize(w, h),
            Ok(_) => continue,
            Err(e) => {
                debug!("terminal event reader stopped: {e}");
                return;
            }
        };
        if tx.send(ev).is_err() {
            return;
        }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Scripted event source for tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are due on a fixed schedule, so a steady stream of key events
/// cannot starve the clock.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Next event, `Tick` when the tick is due, `Closed` once the source hangs up
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            self.schedule_tick(now);
            return AppEvent::Tick;
        }
        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.schedule_tick(Instant::now());
                AppEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => AppEvent::Closed,
        }
    }

    fn schedule_tick(&mut self, now: Instant) {
        self.next_tick += self.ticker.interval();
        // fell behind by more than a period, restart the schedule from now
        if self.next_tick <= now {
            self.next_tick = now + self.ticker.interval();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize(80, 24)).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_secs(10));
        let mut runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), AppEvent::Resize(80, 24));
    }

    #[test]
    fn step_reports_closed_source() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_secs(10)),
        );

        assert_eq!(runner.step(), AppEvent::Closed);
    }

    #[test]
    fn ticks_keep_coming_under_steady_input() {
        let (tx, rx) = mpsc::channel();
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        for _ in 0..200 {
            tx.send(AppEvent::Key(key)).unwrap();
        }
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );

        let mut saw_tick = false;
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            match runner.step() {
                AppEvent::Tick => {
                    saw_tick = true;
                    break;
                }
                AppEvent::Key(_) => std::thread::sleep(Duration::from_millis(1)),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(saw_tick);
    }
}
