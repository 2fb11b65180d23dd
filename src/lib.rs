// Library surface for the binary, headless integration tests and reuse.
// Rendering and terminal plumbing stay thin; the session engine lives here.
pub mod app;
pub mod app_dirs;
pub mod logging;
pub mod options;
pub mod persist;
pub mod results;
pub mod review;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod storage;
pub mod textwrap;
pub mod time_series;
pub mod ui;
pub mod util;
pub mod words;

pub use options::{Mode, Options};
pub use session::Session;

/// Scheduler tick period for the event loop
pub const TICK_RATE_MS: u64 = 80;
