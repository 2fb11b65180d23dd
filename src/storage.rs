use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::options::{Mode, Options};

/// Persisted option choices, restored on the next launch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub mode: String,
    pub duration_seconds: i64,
    pub word_count: i64,
    pub punctuation: bool,
    pub numbers: bool,
}

impl From<&Options> for Preferences {
    fn from(options: &Options) -> Self {
        Self {
            mode: options.mode.to_string(),
            duration_seconds: i64::try_from(options.duration.as_secs()).unwrap_or(i64::MAX),
            word_count: i64::try_from(options.word_count).unwrap_or(i64::MAX),
            punctuation: options.punctuation,
            numbers: options.numbers,
        }
    }
}

impl Preferences {
    /// Overlay these preferences on `base`. Non-positive lengths keep the base value.
    pub fn apply_to(&self, base: Options) -> Options {
        let mut options = base;
        options.mode = Mode::from_name(&self.mode);
        options.punctuation = self.punctuation;
        options.numbers = self.numbers;
        if let Ok(secs) = u64::try_from(self.duration_seconds) {
            if secs > 0 {
                options.duration = Duration::from_secs(secs);
            }
        }
        if let Ok(count) = usize::try_from(self.word_count) {
            if count > 0 {
                options.word_count = count;
            }
        }
        options
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BestScore {
    pub wpm: u32,
    pub accuracy: u32,
    /// Unix seconds
    pub timestamp: i64,
}

/// Everything written to the state file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Data {
    pub preferences: Preferences,
    pub best_scores: HashMap<String, BestScore>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("state file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Store: Send + 'static {
    fn load(&self) -> Result<Data, StoreError>;
    fn save(&self, data: &Data) -> Result<(), StoreError>;
}

/// JSON state file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let path = AppDirs::state_path().unwrap_or_else(|| PathBuf::from("typebeat_state.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for FileStore {
    /// A missing file is a first run, not an error
    fn load(&self) -> Result<Data, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Data::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write to a sibling temp file and rename it over the target, so readers
    /// never see a half-written file
    fn save(&self, data: &Data) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.temp_path();
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// In-memory store shared between clones, for tests and `--no-save` style runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    data: Option<Data>,
    saves: usize,
}

impl MemoryStore {
    /// Last saved data, if any
    pub fn data(&self) -> Option<Data> {
        self.lock().data.clone()
    }

    /// Number of completed saves
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Data, StoreError> {
        Ok(self.lock().data.clone().unwrap_or_default())
    }

    fn save(&self, data: &Data) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.data = Some(data.clone());
        state.saves += 1;
        Ok(())
    }
}
