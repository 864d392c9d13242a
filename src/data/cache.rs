use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::LoadError;
use super::model::Table;

/// Identity of a file on disk at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub len: u64,
}

impl CacheKey {
    /// Stat `path`. Fails when the file cannot be found or read.
    pub fn for_path(path: &Path) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.display().to_string(),
            source,
        };
        let path = path.canonicalize().map_err(io_err)?;
        let meta = std::fs::metadata(&path).map_err(io_err)?;
        Ok(Self {
            modified: meta.modified().map_err(io_err)?,
            len: meta.len(),
            path,
        })
    }
}

/// Loaded tables keyed by file identity and modification time.
///
/// Only the newest version of each path is kept: loading a file whose
/// timestamp or size changed replaces the stale entry.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, (CacheKey, Arc<Table>)>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, or run `load` and remember it.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Arc<Table>, LoadError>
    where
        F: FnOnce(&Path) -> Result<Table, LoadError>,
    {
        let key = CacheKey::for_path(path)?;
        if let Some((cached_key, table)) = self.entries.get(&key.path) {
            if *cached_key == key {
                log::debug!("cache hit for {}", key.path.display());
                return Ok(Arc::clone(table));
            }
            log::debug!("{} changed on disk, reloading", key.path.display());
        }

        let table = Arc::new(load(&key.path)?);
        self.entries
            .insert(key.path.clone(), (key, Arc::clone(&table)));
        Ok(table)
    }

    /// Forget `path`. Returns whether anything was cached for it.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
