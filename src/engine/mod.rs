//! Header editing engine.
//!
//! Every file goes through `Opened -> Validated -> Mutated -> Persisted`, or
//! ends `Failed`/`Skipped`. Handlers only read the container and return a
//! plan of mutations; the plan is applied and persisted in one step, so a
//! file is either fully edited or left as it was.

mod chain;
mod compute;
mod records;
mod time;

use std::path::Path;

use tracing::{debug, warn};

use crate::astro::{AlmanacSolarCorrection, HeliocentricCorrection};
use crate::error::{EditError, Result};
use crate::header::{HeaderRecord, HeaderValue};
use crate::operations::Operation;
use crate::store::{Position, RecordContainer, RecordStore};
use crate::validate::validate_record;

pub use time::{parse_datetime, shift_text};

/// A single change to a header, produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert(Position, HeaderRecord),
    Replace(usize, HeaderRecord),
    Remove(usize),
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEdit {
    Persisted,
    Skipped(String),
}

pub struct Engine<S> {
    store: S,
    heliocentric: Box<dyn HeliocentricCorrection>,
}

impl<S: RecordStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            heliocentric: Box::new(AlmanacSolarCorrection),
        }
    }

    /// Swap the algorithm used to turn JD into HJD.
    pub fn with_heliocentric(mut self, correction: impl HeliocentricCorrection + 'static) -> Self {
        self.heliocentric = Box::new(correction);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one operation to one file.
    pub fn edit_file(&self, operation: &Operation, path: &Path) -> Result<FileEdit> {
        let mut container = self.store.open(path)?;
        debug!(path = %path.display(), records = container.len(), "opened");

        let mutations = match self.plan(operation, &container) {
            Ok(mutations) => mutations,
            Err(e) if e.is_absence() && operation.skip_if_missing() => {
                warn!(path = %path.display(), "skipped: {e}");
                return Ok(FileEdit::Skipped(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        debug!(path = %path.display(), count = mutations.len(), "validated");

        for mutation in mutations {
            apply(&mut container, mutation)?;
        }
        debug!(path = %path.display(), "mutated");

        container.persist()?;
        debug!(path = %path.display(), "persisted");
        Ok(FileEdit::Persisted)
    }

    /// Validate the operation against the current header and compute the
    /// mutations it needs, without changing anything.
    pub fn plan<C: RecordContainer>(&self, operation: &Operation, container: &C) -> Result<Vec<Mutation>> {
        match operation {
            Operation::AddToEnd {
                record,
                update_if_exists,
            } => records::plan_add(container, record, Position::End, *update_if_exists),
            Operation::AddAtIndex {
                record,
                index,
                update_if_exists,
            } => records::plan_add(container, record, Position::Index(*index), *update_if_exists),
            Operation::RemoveByKeyword { keyword, .. } => records::plan_remove(container, keyword),
            Operation::RemoveAtIndex { index, .. } => records::plan_remove_at(container, *index),
            Operation::ChangeKeyword { from, to, .. } => records::plan_rename(container, from, to),
            Operation::ChangeValueByKeyword {
                keyword,
                value,
                comment,
                ..
            } => records::plan_change_value(container, keyword, value, comment.as_deref()),
            Operation::ChainRecords {
                keyword,
                parts,
                comment,
                update_if_exists,
                ..
            } => chain::plan_chain(container, keyword, parts, comment.as_deref(), *update_if_exists),
            Operation::ShiftTime { keyword, shift, .. } => time::plan_shift(container, keyword, shift),
            Operation::ComputeJd {
                source,
                keyword,
                comment,
                update_if_exists,
                ..
            } => compute::plan_jd(container, source, keyword, comment.as_deref(), *update_if_exists),
            Operation::ComputeHjd {
                source,
                ra,
                dec,
                keyword,
                comment,
                update_if_exists,
                ..
            } => compute::plan_hjd(
                container,
                self.heliocentric.as_ref(),
                compute::HjdRequest {
                    source,
                    ra,
                    dec,
                    keyword,
                    comment: comment.as_deref(),
                    update_if_exists: *update_if_exists,
                },
            ),
        }
    }
}

fn apply<C: RecordContainer>(container: &mut C, mutation: Mutation) -> Result<()> {
    match mutation {
        Mutation::Insert(position, record) => container.insert(position, record),
        Mutation::Replace(index, record) => container.replace(index, record).map(drop),
        Mutation::Remove(index) => container.remove_at(index).map(drop),
    }
}

/// Write a value under `keyword`: replace the existing record when allowed,
/// otherwise append a new one. A `None` comment keeps the existing comment.
pub(crate) fn upsert<C: RecordContainer>(
    container: &C,
    keyword: &str,
    value: HeaderValue,
    comment: Option<String>,
    update_if_exists: bool,
) -> Result<Vec<Mutation>> {
    let index = container.position(keyword);
    let record = match index {
        Some(_) if !update_if_exists => {
            return Err(EditError::ValidationFailure(format!(
                "keyword {keyword} already exists"
            )))
        }
        Some(index) => container.records()[index].with_value(value, comment),
        None => HeaderRecord::new(keyword, Some(value), comment),
    };
    validate_record(&record)?;
    Ok(vec![match index {
        Some(index) => Mutation::Replace(index, record),
        None => Mutation::Insert(Position::End, record),
    }])
}
