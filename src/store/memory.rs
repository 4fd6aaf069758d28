use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{EditError, Result};
use crate::header::HeaderRecord;
use crate::store::{RecordContainer, RecordStore};

type Files = BTreeMap<PathBuf, Vec<HeaderRecord>>;

/// Record store backed by a shared in-memory map of path to header.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<Files>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, records: Vec<HeaderRecord>) {
        self.files().insert(path.into(), records);
    }

    /// Persisted records of a file.
    pub fn records(&self, path: impl AsRef<Path>) -> Option<Vec<HeaderRecord>> {
        self.files().get(path.as_ref()).cloned()
    }

    fn files(&self) -> MutexGuard<'_, Files> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    type Container = MemoryContainer;

    fn open(&self, path: &Path) -> Result<MemoryContainer> {
        let records = self.records(path).ok_or_else(|| {
            EditError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })?;
        Ok(MemoryContainer {
            path: path.to_path_buf(),
            records,
            files: Arc::clone(&self.files),
        })
    }
}

#[derive(Debug)]
pub struct MemoryContainer {
    path: PathBuf,
    records: Vec<HeaderRecord>,
    files: Arc<Mutex<Files>>,
}

impl RecordContainer for MemoryContainer {
    fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    fn records_mut(&mut self) -> &mut Vec<HeaderRecord> {
        &mut self.records
    }

    fn persist(&mut self) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.path.clone(), self.records.clone());
        Ok(())
    }
}
