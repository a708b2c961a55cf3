//! Session persistence: JSON save/restore for [`GameState`].
//!
//! Scoped to JSON, one file per session. Not a relational store; this
//! exists so a session can survive a process restart or move between
//! `astinus-cli` invocations.

use crate::game_state::GameState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file format version.
const SAVE_VERSION: u32 = 1;

/// A saved session: the full [`GameState`] plus a version tag and
/// timestamp for compatibility checking and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub version: u32,
    pub saved_at: chrono::DateTime<chrono::Utc>,
    pub state: GameState,
}

impl SavedSession {
    pub fn new(state: GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono::Utc::now(),
            state,
        }
    }

    /// Save to a JSON file, pretty-printed for human inspection.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file, checking the save version matches.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read just enough of a save file to identify it, without
    /// deserializing the full `GameState`.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveInfo, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            saved_at: chrono::DateTime<chrono::Utc>,
            state: PartialState,
        }
        #[derive(Deserialize)]
        struct PartialState {
            session_id: String,
            current_location: String,
            turn_count: u64,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(SaveInfo {
            session_id: partial.state.session_id,
            current_location: partial.state.current_location,
            turn_count: partial.state.turn_count,
            saved_at: partial.saved_at,
        })
    }
}

/// Identifying metadata for a save file, without the full state.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub session_id: String,
    pub current_location: String,
    pub turn_count: u64,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

/// List save files (`*.json`) in a directory, most recently saved first.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<(std::path::PathBuf, SaveInfo)>, PersistError> {
    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(info) = SavedSession::peek_metadata(&path).await {
                saves.push((path, info));
            }
        }
    }

    saves.sort_by(|a, b| b.1.saved_at.cmp(&a.1.saved_at));
    Ok(saves)
}

/// Build the canonical save path for a session id within `base_dir`.
pub fn session_save_path(base_dir: impl AsRef<Path>, session_id: &str) -> std::path::PathBuf {
    let sanitized = session_id
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}.json"))
}
