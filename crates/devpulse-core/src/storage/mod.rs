mod config;
pub mod database;

pub use config::{Config, ScoringConfig, StreakConfig, SyncConfig};
pub use database::{Database, VersionedStreak};

use std::path::PathBuf;

/// Returns the data directory, `~/.config/devpulse[-dev]/` by default.
///
/// `DEVPULSE_DATA_DIR` overrides the location outright (used by tests);
/// `DEVPULSE_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match std::env::var("DEVPULSE_DATA_DIR") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DEVPULSE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("devpulse-dev")
            } else {
                base_dir.join("devpulse")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
