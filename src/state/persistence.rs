use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::Document;

/// Format version written into every project file
pub const PROJECT_VERSION: u32 = 1;

/// Errors that can occur while saving or loading projects
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize project: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to access project file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported project version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid project data: {0}")]
    InvalidProject(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// What goes into a project file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub version: u32,
    /// Seconds since the UNIX epoch when the snapshot was taken
    pub timestamp: u64,
    pub document: Document,
}

impl ProjectSnapshot {
    pub fn new(document: &Document) -> Self {
        Self {
            version: PROJECT_VERSION,
            timestamp: timestamp_secs(),
            document: document.clone(),
        }
    }

    /// Checks the invariants a deserialized document cannot enforce itself
    pub fn validate(&self) -> PersistenceResult<()> {
        if self.version != PROJECT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }
        let doc = &self.document;
        if doc.layers().is_empty() {
            return Err(PersistenceError::InvalidProject("no layers".into()));
        }
        let frame_count = doc.frame_count();
        if frame_count == 0 {
            return Err(PersistenceError::InvalidProject("no frames".into()));
        }
        for layer in doc.layers() {
            if layer.frame_count() != frame_count {
                return Err(PersistenceError::InvalidProject(format!(
                    "layer '{}' has {} frames, expected {}",
                    layer.name,
                    layer.frame_count(),
                    frame_count
                )));
            }
            let wrong_size = layer
                .frames
                .iter()
                .any(|f| f.buffer.width() != doc.width() || f.buffer.height() != doc.height());
            if wrong_size {
                return Err(PersistenceError::InvalidProject(format!(
                    "layer '{}' does not match the {}x{} canvas",
                    layer.name,
                    doc.width(),
                    doc.height()
                )));
            }
        }
        if doc.active_layer_index() >= doc.layers().len() || doc.active_frame_index() >= frame_count {
            return Err(PersistenceError::InvalidProject("active layer or frame out of range".into()));
        }
        Ok(())
    }
}

/// Writes `document` to `path` as JSON
pub fn save_document(document: &Document, path: &Path) -> PersistenceResult<()> {
    let json = serde_json::to_string(&ProjectSnapshot::new(document))?;
    fs::write(path, json)?;
    log::info!("Saved project to {}", path.display());
    Ok(())
}

/// Reads and validates a project written by [`save_document`]
pub fn load_document(path: &Path) -> PersistenceResult<Document> {
    let json = fs::read_to_string(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_str(&json)?;
    snapshot.validate()?;
    log::info!("Loaded project from {}", path.display());
    Ok(snapshot.document)
}

/// Rotating autosaves in one directory
#[derive(Debug, Clone)]
pub struct StatePersistence {
    /// Directory where autosave files are stored
    state_dir: PathBuf,
    /// Maximum number of autosave files to keep
    max_autosaves: usize,
}

impl StatePersistence {
    pub fn new(state_dir: impl Into<PathBuf>, max_autosaves: usize) -> Self {
        Self {
            state_dir: state_dir.into(),
            max_autosaves: max_autosaves.max(1),
        }
    }

    /// Save `document` as a new autosave and prune old ones
    pub fn autosave(&self, document: &Document, sequence: u64) -> PersistenceResult<PathBuf> {
        fs::create_dir_all(&self.state_dir)?;
        let path = self
            .state_dir
            .join(format!("autosave_{}_{:06}.json", timestamp_secs(), sequence));
        save_document(document, &path)?;
        self.cleanup_old_autosaves()?;
        Ok(path)
    }

    fn autosaves(&self) -> PersistenceResult<Vec<PathBuf>> {
        let mut autosaves: Vec<PathBuf> = fs::read_dir(&self.state_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("autosave_"))
            .map(|entry| entry.path())
            .collect();
        // Names embed the timestamp and sequence, so they sort chronologically
        autosaves.sort();
        Ok(autosaves)
    }

    /// Remove the oldest autosaves beyond the limit
    fn cleanup_old_autosaves(&self) -> PersistenceResult<()> {
        let autosaves = self.autosaves()?;
        let excess = autosaves.len().saturating_sub(self.max_autosaves);
        for oldest in autosaves.iter().take(excess) {
            fs::remove_file(oldest)?;
        }
        Ok(())
    }

    /// Find the most recent autosave file
    pub fn find_latest_autosave(&self) -> PersistenceResult<Option<PathBuf>> {
        if !self.state_dir.exists() {
            return Ok(None);
        }
        Ok(self.autosaves()?.pop())
    }

    /// Loads the most recent autosave, if there is one
    pub fn restore_latest(&self) -> PersistenceResult<Option<Document>> {
        match self.find_latest_autosave()? {
            Some(path) => load_document(&path).map(Some),
            None => Ok(None),
        }
    }
}

fn timestamp_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
