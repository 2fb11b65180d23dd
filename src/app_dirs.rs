use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typebeat";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// Preferences and best scores
    pub fn state_path() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().join("state.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::project().map(|dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.data_local_dir())
                .join(format!("{APP_NAME}.log"))
        })
    }
}
