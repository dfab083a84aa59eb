use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "keytap";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/keytap`, or the platform data dir without `$HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn store_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("store.json"))
            .unwrap_or_else(|| PathBuf::from("keytap_store.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("keytap.log"))
            .unwrap_or_else(|| PathBuf::from("keytap.log"))
    }
}
