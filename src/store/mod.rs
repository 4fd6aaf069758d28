//! Record-store abstraction the engine edits headers through.
//!
//! A store opens one container per file. Containers hold the header records
//! in memory; nothing reaches the backing file until [`RecordContainer::persist`]
//! is called, and dropping a container releases it without writing.

pub mod memory;

use std::path::Path;

use crate::error::{EditError, Result};
use crate::header::HeaderRecord;

pub use memory::MemoryStore;

/// Where a new record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    End,
    Index(usize),
}

/// An open header: an ordered list of records plus a way to save it.
///
/// Implementors provide access to the record list and `persist`; lookups,
/// inserts and removals are built on top of that.
pub trait RecordContainer {
    fn records(&self) -> &[HeaderRecord];

    fn records_mut(&mut self) -> &mut Vec<HeaderRecord>;

    /// Write the current records back to the underlying file.
    fn persist(&mut self) -> Result<()>;

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        self.records().iter().position(|r| r.keyword() == keyword)
    }

    fn record(&self, keyword: &str) -> Option<&HeaderRecord> {
        self.records().iter().find(|r| r.keyword() == keyword)
    }

    fn record_at(&self, index: usize) -> Option<&HeaderRecord> {
        self.records().get(index)
    }

    fn insert(&mut self, position: Position, record: HeaderRecord) -> Result<()> {
        let len = self.len();
        match position {
            Position::End => self.records_mut().push(record),
            Position::Index(index) if index <= len => self.records_mut().insert(index, record),
            Position::Index(index) => return Err(EditError::IndexOutOfRange { index, len }),
        }
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<HeaderRecord> {
        let len = self.len();
        if index >= len {
            return Err(EditError::IndexOutOfRange { index, len });
        }
        Ok(self.records_mut().remove(index))
    }

    fn remove(&mut self, keyword: &str) -> Result<HeaderRecord> {
        let index = self
            .position(keyword)
            .ok_or_else(|| EditError::KeywordNotFound(keyword.to_string()))?;
        self.remove_at(index)
    }

    fn replace(&mut self, index: usize, record: HeaderRecord) -> Result<HeaderRecord> {
        let len = self.len();
        let slot = self
            .records_mut()
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, record))
    }
}

/// Opens record containers by path.
pub trait RecordStore: Sync {
    type Container: RecordContainer;

    fn open(&self, path: &Path) -> Result<Self::Container>;
}
