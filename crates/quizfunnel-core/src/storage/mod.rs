mod config;
pub mod database;
mod keys;
mod memory;

pub use config::{
    CheckoutLink, CountdownConfig, FunnelConfig, LoadingConfig, LoadingMode, OfferConfig,
    PlaybackConfig, QuizConfig, RevealConfig, RevealSource,
};
pub use database::SqliteStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Durable key-value capability the funnel persists through.
///
/// Values are whole strings; a `set` fully overwrites the previous value.
/// Implementations use interior mutability so that several components can
/// share one store behind an `Rc`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns `~/.config/quizfunnel[-dev]/` based on QUIZFUNNEL_ENV.
///
/// Set QUIZFUNNEL_ENV=dev to use the development data directory, or
/// QUIZFUNNEL_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("QUIZFUNNEL_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("QUIZFUNNEL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("quizfunnel-dev")
            } else {
                base_dir.join("quizfunnel")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
