// src/store.rs
//! Snapshot persistence.
//!
//! Two seams keep the diff logic storage-agnostic: [`Storage`] is the raw
//! byte contract (read / write / list) and [`SnapshotStore`] is the keyed view
//! the engine talks to. Layout of [`FileSnapshotStore`]:
//!
//! ```text
//! <results_dir>/<slug>_<stamp>.json    one file per run
//! <results_dir>/latest/<slug>.json     copy of the site's most recent run
//! ```

use crate::error::{A11yError, Result};
use crate::site::{SiteId, SNAPSHOT_EXT};
use crate::types::Snapshot;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const LATEST_DIR: &str = "latest";
pub const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

/// Byte-level persistence contract.
pub trait Storage {
    /// # Errors
    /// Returns the underlying I/O error; `NotFound` when `path` is absent.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// # Errors
    /// Returns the underlying I/O error.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// File names directly inside `dir`, sorted.
    ///
    /// # Errors
    /// Returns the underlying I/O error; `NotFound` when `dir` is absent.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Local filesystem storage with atomic writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        atomic_write(path, bytes)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);

    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)
}

/// In-memory storage, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect())
    }
}

/// Snapshots keyed by site.
pub trait SnapshotStore {
    /// The site's most recent snapshot, if one exists and parses.
    fn get(&self, site: &SiteId) -> Option<Snapshot>;

    /// An explicitly chosen snapshot, if it exists and parses.
    fn get_named(&self, name: &str) -> Option<Snapshot>;

    /// Persists a run, then points the site's latest entry at it.
    /// Returns where the run was stored.
    ///
    /// # Errors
    /// Returns error if serialization or either write fails.
    fn put(&self, site: &SiteId, snapshot: &Snapshot) -> Result<String>;
}

pub struct FileSnapshotStore<S: Storage = FsStorage> {
    storage: S,
    results_dir: PathBuf,
}

impl FileSnapshotStore<FsStorage> {
    pub fn on_disk(results_dir: impl Into<PathBuf>) -> Self {
        Self::new(FsStorage, results_dir)
    }
}

impl<S: Storage> FileSnapshotStore<S> {
    pub fn new(storage: S, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            results_dir: results_dir.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn latest_path(&self, site: &SiteId) -> PathBuf {
        self.results_dir
            .join(LATEST_DIR)
            .join(format!("{}{SNAPSHOT_EXT}", site.slug()))
    }

    #[must_use]
    pub fn run_path(&self, site: &SiteId, timestamp: DateTime<Utc>) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}{SNAPSHOT_EXT}",
            site.slug(),
            timestamp.format(STAMP_FORMAT)
        ))
    }

    fn load(&self, path: &Path) -> Option<Snapshot> {
        let bytes = match self.storage.read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no baseline snapshot");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable baseline snapshot, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed baseline snapshot, treating as absent");
                None
            }
        }
    }

    fn write_json(&self, path: &Path, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| A11yError::json(e, path))?;
        self.storage
            .write(path, &bytes)
            .map_err(|e| A11yError::io(e, path))
    }
}

impl<S: Storage> SnapshotStore for FileSnapshotStore<S> {
    fn get(&self, site: &SiteId) -> Option<Snapshot> {
        self.load(&self.latest_path(site))
    }

    fn get_named(&self, name: &str) -> Option<Snapshot> {
        let named = Path::new(name);
        if named.is_absolute() {
            self.load(named)
        } else {
            self.load(&self.results_dir.join(named))
        }
    }

    fn put(&self, site: &SiteId, snapshot: &Snapshot) -> Result<String> {
        let run_path = self.run_path(site, snapshot.timestamp);
        self.write_json(&run_path, snapshot)?;
        self.write_json(&self.latest_path(site), snapshot)?;

        info!(site = %site, path = %run_path.display(), "persisted snapshot");
        Ok(run_path.display().to_string())
    }
}
