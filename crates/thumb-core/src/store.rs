//! Thumbnail persistence: opaque JSON blobs keyed by id.
//!
//! Two backends: [`MemoryStore`] for sessions and tests, and [`FileStore`]
//! which keeps one `<id>.json` file per thumbnail in a directory.

use crate::config::ThumbnailConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const MAX_ID_LEN: usize = 64;

/// File-name safe thumbnail identifier: `[A-Za-z0-9_-]{1,64}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThumbnailId(String);

impl ThumbnailId {
    pub fn new(id: impl Into<String>) -> Result<Self, StoreError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(id))
        } else {
            Err(StoreError::InvalidId(id))
        }
    }

    /// Fresh id from the clock plus a process-local counter.
    pub fn generate() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("thumb_{millis:x}_{n:04x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThumbnailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ThumbnailId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("thumbnail not found: {0}")]
    NotFound(ThumbnailId),
    #[error("invalid thumbnail id {0:?}")]
    InvalidId(String),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid thumbnail JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// CRUD over saved thumbnail configurations.
pub trait ThumbnailStore {
    /// Store `config` under a new id.
    fn save(&mut self, config: &ThumbnailConfig) -> Result<ThumbnailId, StoreError> {
        let id = ThumbnailId::generate();
        self.save_as(&id, config)?;
        Ok(id)
    }

    /// Create or overwrite the thumbnail `id`.
    fn save_as(&mut self, id: &ThumbnailId, config: &ThumbnailConfig) -> Result<(), StoreError>;

    fn load(&self, id: &ThumbnailId) -> Result<ThumbnailConfig, StoreError>;

    fn delete(&mut self, id: &ThumbnailId) -> Result<(), StoreError>;

    /// All ids, sorted.
    fn list(&self) -> Result<Vec<ThumbnailId>, StoreError>;
}

// ─── Memory ──────────────────────────────────────────────────────────────

/// In-memory store. Keeps serialized JSON so loads go through the same
/// defaulting path as file loads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<ThumbnailId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw JSON blob (e.g. a legacy export) without validation.
    pub fn insert_raw(&mut self, id: ThumbnailId, json: impl Into<String>) {
        self.blobs.insert(id, json.into());
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl ThumbnailStore for MemoryStore {
    fn save_as(&mut self, id: &ThumbnailId, config: &ThumbnailConfig) -> Result<(), StoreError> {
        let json = config.to_json()?;
        self.blobs.insert(id.clone(), json);
        Ok(())
    }

    fn load(&self, id: &ThumbnailId) -> Result<ThumbnailConfig, StoreError> {
        let json = self
            .blobs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(ThumbnailConfig::from_json(json)?)
    }

    fn delete(&mut self, id: &ThumbnailId) -> Result<(), StoreError> {
        self.blobs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn list(&self) -> Result<Vec<ThumbnailId>, StoreError> {
        Ok(self.blobs.keys().cloned().collect())
    }
}

// ─── File ────────────────────────────────────────────────────────────────

/// Directory-backed store, one pretty-printed `<id>.json` per thumbnail.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        log::debug!("thumbnail store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ThumbnailId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

impl ThumbnailStore for FileStore {
    fn save_as(&mut self, id: &ThumbnailId, config: &ThumbnailConfig) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(config)?;
        let path = self.path_for(id);
        // Atomic replace
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("saved thumbnail {id} to {}", path.display());
        Ok(())
    }

    fn load(&self, id: &ThumbnailId) -> Result<ThumbnailConfig, StoreError> {
        let path = self.path_for(id);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ThumbnailConfig::from_json(&json)?)
    }

    fn delete(&mut self, id: &ThumbnailId) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<ThumbnailId>, StoreError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match ThumbnailId::new(stem) {
                Ok(id) => ids.push(id),
                Err(_) => log::trace!("ignoring foreign file {}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextLine;

    fn sample() -> ThumbnailConfig {
        let mut cfg = ThumbnailConfig {
            layout: "soloRight".into(),
            ..Default::default()
        };
        cfg.text_lines.push(TextLine::new("STORED", true));
        cfg
    }

    #[test]
    fn ids_must_be_file_name_safe() {
        assert!(ThumbnailId::new("abc_DEF-123").is_ok());
        assert!(matches!(ThumbnailId::new(""), Err(StoreError::InvalidId(_))));
        assert!(ThumbnailId::new("../etc/passwd").is_err());
        assert!(ThumbnailId::new("a b").is_err());
        assert!(ThumbnailId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let a = ThumbnailId::generate();
        let b = ThumbnailId::generate();
        assert_ne!(a, b);
        assert!(ThumbnailId::new(a.as_str()).is_ok());
    }

    #[test]
    fn memory_store_crud() {
        let mut store = MemoryStore::new();
        let cfg = sample();
        let id = store.save(&cfg).unwrap();
        assert_eq!(store.load(&id).unwrap(), cfg);
        assert_eq!(store.list().unwrap(), vec![id.clone()]);
        store.delete(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.load(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn memory_store_tolerates_legacy_blobs() {
        let mut store = MemoryStore::new();
        let id = ThumbnailId::new("legacy").unwrap();
        store.insert_raw(id.clone(), r#"{"layout":"stacked","accentColor":"blue"}"#);
        let cfg = store.load(&id).unwrap();
        assert_eq!(cfg.layout, "stacked");
        assert_eq!(cfg.width, 1280);
    }

    #[test]
    fn file_store_crud() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = FileStore::open(dir.path().join("thumbs")).unwrap();
        let cfg = sample();
        let id = ThumbnailId::new("first").unwrap();
        store.save_as(&id, &cfg).unwrap();
        assert!(dir.path().join("thumbs/first.json").exists());
        assert_eq!(store.load(&id).unwrap(), cfg);

        let second = store.save(&cfg).unwrap();
        std::fs::write(dir.path().join("thumbs/notes.txt"), "ignored").unwrap();
        let ids = store.list().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&second));

        store.delete(&id).unwrap();
        assert!(matches!(store.load(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn file_store_reports_corrupt_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let id = ThumbnailId::new("broken").unwrap();
        assert!(matches!(store.load(&id), Err(StoreError::Json(_))));
    }
}
