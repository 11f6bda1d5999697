use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{AppSettings, MemoraError, Note, Result};

/// Key of the single persisted record
pub const STORAGE_KEY: &str = "memora-storage";

/// The durable record: every note, the settings and the last search query.
///
/// Unknown fields are ignored and missing ones defaulted so older and newer
/// records both load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub search_query: String,
}

/// Destination for store snapshots
pub trait StateSink: Send {
    /// Hands over a full snapshot. Implementations may write it later.
    fn persist(&self, state: &PersistedState) -> Result<()>;

    /// Failure of a write that completed after `persist` returned
    fn last_failure(&self) -> Option<String> {
        None
    }

    /// Where snapshots end up, for error reporting
    fn location(&self) -> PathBuf;
}

/// The persisted record on disk, written atomically
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Record stored as `<data_dir>/memora-storage.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        StateFile {
            path: data_dir.join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            debug!("No persisted state at {}", self.path.display());
            return Ok(None);
        }

        debug!("Loading persisted state from {}", self.path.display());
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read {}: {}", self.path.display(), e);
            MemoraError::Io(e)
        })?;

        let state: PersistedState = serde_json::from_str(&raw).map_err(|e| {
            error!("Persisted state at {} is malformed: {}", self.path.display(), e);
            MemoraError::Serialization(e)
        })?;

        info!(
            "Loaded {} notes from {}",
            state.notes.len(),
            self.path.display()
        );
        Ok(Some(state))
    }

    /// Writes the record through a temporary file in the same directory
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        self.write_atomic(state)
            .map_err(|e| MemoraError::PersistenceFailure {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    fn write_atomic(&self, state: &PersistedState) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.exists() {
            debug!("Creating data directory: {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                MemoraError::DirectoryError {
                    path: dir.to_path_buf(),
                }
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            MemoraError::Io(e)
        })?;

        trace!("Serializing {} notes", state.notes.len());
        let json = serde_json::to_string_pretty(state)?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            MemoraError::Io(e)
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            MemoraError::Io(e)
        })?;

        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            MemoraError::Io(e.error)
        })?;

        debug!("State written to {}", self.path.display());
        Ok(())
    }
}

impl StateSink for StateFile {
    fn persist(&self, state: &PersistedState) -> Result<()> {
        self.save(state)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Keeps every snapshot in memory. Used for throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    snapshots: Arc<Mutex<Vec<PersistedState>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn latest(&self) -> Option<PersistedState> {
        self.snapshots.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl StateSink for MemorySink {
    fn persist(&self, state: &PersistedState) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|e| MemoraError::PersistenceFailure {
                path: self.location(),
                message: e.to_string(),
            })?;
        snapshots.push(state.clone());
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from(":memory:")
    }
}
