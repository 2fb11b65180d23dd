use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn, LevelFilter};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use typebeat::{
    app::App,
    app_dirs::AppDirs,
    logging::init_file_logger,
    persist::Persister,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    storage::{FileStore, Store},
    ui,
    words::Generator,
    Mode, Options, Session, TICK_RATE_MS,
};

/// minimal typing test for the terminal, with per-setting best scores
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// end the test on a clock or after a fixed number of words
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// seconds to run a time-mode test
    #[clap(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    duration: Option<u64>,

    /// number of words in a words-mode test
    #[clap(short = 'w', long, value_parser = clap::value_parser!(u64).range(1..))]
    words: Option<u64>,

    /// mix punctuation into the text
    #[clap(short = 'p', long, overrides_with = "no_punctuation")]
    punctuation: bool,

    /// leave punctuation out, even if it was on last time
    #[clap(long, overrides_with = "punctuation")]
    no_punctuation: bool,

    /// mix numbers into the text
    #[clap(short = 'n', long, overrides_with = "no_numbers")]
    numbers: bool,

    /// leave numbers out, even if they were on last time
    #[clap(long, overrides_with = "numbers")]
    no_numbers: bool,

    /// seed the word generator for a repeatable text
    #[clap(long)]
    seed: Option<u64>,

    /// state file holding preferences and best scores
    #[clap(long)]
    state_file: Option<PathBuf>,

    /// keep preferences and best scores in memory only
    #[clap(long)]
    no_save: bool,

    /// log level written to the log file
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Cli {
    /// Overlay explicit flags on `base`; absent flags keep the stored preference
    fn apply_to(&self, base: Options) -> Options {
        let mut options = base;
        if let Some(mode) = self.mode {
            options.mode = mode;
        }
        if let Some(secs) = self.duration {
            options.duration = Duration::from_secs(secs);
        }
        if let Some(words) = self.words.and_then(|w| usize::try_from(w).ok()) {
            options.word_count = words;
        }
        if let Some(on) = switch(self.punctuation, self.no_punctuation) {
            options.punctuation = on;
        }
        if let Some(on) = switch(self.numbers, self.no_numbers) {
            options.numbers = on;
        }
        options
    }
}

/// `Some` when the on or off flag was given, `None` to keep the stored value
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        // the app runs fine without a log file
        let _ = init_file_logger(&path, cli.log_level.into());
    }

    let store = cli
        .state_file
        .as_ref()
        .map_or_else(FileStore::new, FileStore::with_path);
    let data = store.load().unwrap_or_else(|e| {
        warn!("ignoring unreadable state file {}: {e}", store.path().display());
        Default::default()
    });
    let persister = (!cli.no_save).then(|| Persister::new(store.clone()));

    let generator = match cli.seed {
        Some(seed) => Generator::from_seed(seed),
        None => Generator::from_entropy(),
    };
    let mut app = App::new(Session::new(Options::default(), generator), data, persister);
    app.apply_preferences();
    let options = cli.apply_to(*app.session.options());
    app.session.set_options(options);
    info!("starting with {:?}", app.session.options());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    app.shutdown();

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);
    let mut needs_render = true;

    loop {
        if needs_render {
            terminal.draw(|f| ui::draw(f, app))?;
            needs_render = false;
        }

        match runner.step() {
            AppEvent::Key(key) => {
                let outcome = app.handle_key(key, Instant::now());
                if outcome.quit {
                    break;
                }
                needs_render |= outcome.changed;
            }
            AppEvent::Resize(width, height) => {
                app.resize(width, height);
                needs_render = true;
            }
            AppEvent::Tick => needs_render |= app.on_tick(Instant::now()),
            AppEvent::Closed => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typebeat"]);

        assert_eq!(cli.mode, None);
        assert_eq!(cli.duration, None);
        assert_eq!(cli.words, None);
        assert!(!cli.punctuation && !cli.numbers && !cli.no_save);
        assert!(matches!(cli.log_level, LogLevel::Info));
    }

    #[test]
    fn test_cli_overrides_preferences() {
        let cli = Cli::parse_from(["typebeat", "-m", "words", "-w", "25", "--numbers"]);
        let base = Options {
            duration: Duration::from_secs(30),
            punctuation: true,
            ..Options::default()
        };
        let options = cli.apply_to(base);

        assert_eq!(options.mode, Mode::Words);
        assert_eq!(options.word_count, 25);
        assert_eq!(options.duration, Duration::from_secs(30));
        assert!(options.punctuation && options.numbers);
    }

    #[test]
    fn test_cli_can_turn_stored_switches_off() {
        let stored = Options {
            punctuation: true,
            numbers: true,
            ..Options::default()
        };

        let cli = Cli::parse_from(["typebeat", "--no-punctuation"]);
        let options = cli.apply_to(stored);
        assert!(!options.punctuation);
        assert!(options.numbers);

        let cli = Cli::parse_from(["typebeat", "--no-numbers"]);
        assert!(!cli.apply_to(stored).numbers);

        // the last of a pair wins
        let cli = Cli::parse_from(["typebeat", "--no-punctuation", "--punctuation"]);
        assert!(cli.apply_to(Options::default()).punctuation);
        let cli = Cli::parse_from(["typebeat", "--punctuation", "--no-punctuation"]);
        assert!(!cli.apply_to(stored).punctuation);

        assert_eq!(Cli::parse_from(["typebeat"]).apply_to(stored), stored);
    }

    #[test]
    fn test_cli_duration() {
        let cli = Cli::parse_from(["typebeat", "--duration", "120"]);
        assert_eq!(cli.apply_to(Options::default()).duration, Duration::from_secs(120));
        assert!(Cli::try_parse_from(["typebeat", "--duration", "0"]).is_err());
        assert!(Cli::try_parse_from(["typebeat", "--words", "0"]).is_err());
    }

    #[test]
    fn test_cli_mode_values() {
        assert!(Cli::try_parse_from(["typebeat", "--mode", "time"]).is_ok());
        assert!(Cli::try_parse_from(["typebeat", "--mode", "quotes"]).is_err());
    }

    #[test]
    fn test_log_level_filter() {
        let cli = Cli::parse_from(["typebeat", "--log-level", "debug"]);
        assert_eq!(LevelFilter::from(cli.log_level), LevelFilter::Debug);
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::Off);
    }
}
