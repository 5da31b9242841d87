//! Persisted session state.
//!
//! A single JSON file holding the resume point: the last bound track, the
//! last observed playback position, and the folder the user last browsed.
//! Saved after every command that changes track or position, loaded once
//! at startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

/// State file name under the user's home directory.
const STATE_FILE_NAME: &str = ".lector.json";

/// The persisted resume state. Field names are the on-disk JSON keys and
/// must not change without a migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Path of the last bound track, or `None` if none was bound.
    pub audio_file: Option<PathBuf>,
    /// Last observed playback position in seconds.
    pub position: f64,
    /// Folder the user last selected an input from.
    pub last_folder: PathBuf,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            audio_file: None,
            position: 0.0,
            last_folder: PathBuf::from("."),
        }
    }
}

/// Loads and saves [`PersistedState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by a specific file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the user's home directory.
    /// Falls back to the working directory when no home is known.
    #[must_use]
    pub fn default_location() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(STATE_FILE_NAME))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// A missing file is not an error and yields the default state. A
    /// malformed file is reported as [`StoreError::Malformed`]; callers
    /// typically log it and start fresh rather than abort.
    pub fn load(&self) -> Result<PersistedState, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting fresh");
                return Ok(PersistedState::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`load`](Self::load), but treats a malformed file as fresh
    /// state after logging it.
    #[must_use]
    pub fn load_or_default(&self) -> PersistedState {
        match self.load() {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "discarding unreadable state file");
                PersistedState::default()
            }
        }
    }

    /// Write the state atomically: serialize to a sibling temp file, then
    /// rename over the target.
    pub fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(state).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::at(dir.path().join("state.json"));
        let state = store.load().unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::at(dir.path().join("state.json"));
        let state = PersistedState {
            audio_file: Some(PathBuf::from("/books/out.mp3")),
            position: 123.45,
            last_folder: PathBuf::from("/books"),
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn on_disk_keys_are_stable() {
        let state = PersistedState {
            audio_file: Some(PathBuf::from("a.mp3")),
            position: 7.0,
            last_folder: PathBuf::from("/b"),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"audio_file\""));
        assert!(json.contains("\"position\""));
        assert!(json.contains("\"last_folder\""));
    }

    #[test]
    fn null_audio_file_parses() {
        let parsed: PersistedState =
            serde_json::from_str(r#"{"audio_file":null,"position":0.0,"last_folder":"."}"#)
                .unwrap();
        assert!(parsed.audio_file.is_none());
    }

    #[test]
    fn malformed_file_is_reported_but_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let store = StateStore::at(&path);
        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
        assert_eq!(store.load_or_default(), PersistedState::default());
    }
}
