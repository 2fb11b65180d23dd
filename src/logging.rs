use std::fs::{self, File};
use std::io;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

/// Send `log` records to `path`, truncating it.
///
/// The terminal belongs to the UI while a session runs, so records never go
/// to stdout or stderr. A logger that is already installed is left in place.
pub fn init_file_logger(path: &Path, level: LevelFilter) -> io::Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Debug)
        .build();
    if WriteLogger::init(level, config, file).is_err() {
        log::debug!("logger already installed, keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn off_creates_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("typebeat.log");
        init_file_logger(&path, LevelFilter::Off).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn creates_parent_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("typebeat.log");
        init_file_logger(&path, LevelFilter::Info).unwrap();
        assert!(path.exists());
    }
}
