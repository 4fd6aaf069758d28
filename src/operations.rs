//! Operation descriptors: what to do, to which files, with which switches.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::{EditError, Result};
use crate::header::{HeaderRecord, HeaderValue};
use crate::sexagesimal::{DegreesObject, TimeObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationType {
    AddToEnd,
    AddAtIndex,
    RemoveByKeyword,
    RemoveAtIndex,
    ChangeKeyword,
    ChangeValueByKeyword,
    ChainRecords,
    ShiftTime,
    ComputeJd,
    ComputeHjd,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::AddToEnd => "add to end",
            OperationType::AddAtIndex => "add at index",
            OperationType::RemoveByKeyword => "remove by keyword",
            OperationType::RemoveAtIndex => "remove at index",
            OperationType::ChangeKeyword => "change keyword",
            OperationType::ChangeValueByKeyword => "change value",
            OperationType::ChainRecords => "chain records",
            OperationType::ShiftTime => "shift time",
            OperationType::ComputeJd => "compute JD",
            OperationType::ComputeHjd => "compute HJD",
        };
        f.write_str(name)
    }
}

/// One element of a chain template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainValue {
    Constant(String),
    KeywordRef(String),
}

/// Signed offset applied by a time shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeShift {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl TimeShift {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_subsecond_part(&self) -> bool {
        self.nanoseconds % 1_000_000_000 != 0
    }

    /// The whole shift as a `chrono` duration, or `None` on overflow.
    pub fn to_duration(&self) -> Option<Duration> {
        Duration::try_days(self.days)?
            .checked_add(&Duration::try_hours(self.hours)?)?
            .checked_add(&Duration::try_minutes(self.minutes)?)?
            .checked_add(&Duration::try_seconds(self.seconds)?)?
            .checked_add(&Duration::nanoseconds(self.nanoseconds))
    }
}

/// Where the observation time comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSource {
    Keyword(String),
    Explicit(NaiveDateTime),
}

/// Where the right ascension comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RaSource {
    /// Real values are degrees, text values are `HH:MM:SS` hours.
    Keyword(String),
    Explicit(TimeObject),
}

/// Where the declination comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DecSource {
    /// Real values are degrees, text values are `DD:MM:SS` degrees.
    Keyword(String),
    Explicit(DegreesObject),
}

/// Operation-specific parameters and behaviour switches.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddToEnd {
        record: HeaderRecord,
        update_if_exists: bool,
    },
    AddAtIndex {
        record: HeaderRecord,
        index: usize,
        update_if_exists: bool,
    },
    RemoveByKeyword {
        keyword: String,
        skip_if_missing: bool,
    },
    RemoveAtIndex {
        index: usize,
        skip_if_missing: bool,
    },
    ChangeKeyword {
        from: String,
        to: String,
        skip_if_missing: bool,
    },
    ChangeValueByKeyword {
        keyword: String,
        value: HeaderValue,
        comment: Option<String>,
        skip_if_missing: bool,
    },
    ChainRecords {
        keyword: String,
        parts: Vec<ChainValue>,
        comment: Option<String>,
        update_if_exists: bool,
        skip_if_missing: bool,
    },
    ShiftTime {
        keyword: String,
        shift: TimeShift,
        skip_if_missing: bool,
    },
    ComputeJd {
        source: TimeSource,
        keyword: String,
        comment: Option<String>,
        update_if_exists: bool,
        skip_if_missing: bool,
    },
    ComputeHjd {
        source: TimeSource,
        ra: RaSource,
        dec: DecSource,
        keyword: String,
        comment: Option<String>,
        update_if_exists: bool,
        skip_if_missing: bool,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationType {
        match self {
            Operation::AddToEnd { .. } => OperationType::AddToEnd,
            Operation::AddAtIndex { .. } => OperationType::AddAtIndex,
            Operation::RemoveByKeyword { .. } => OperationType::RemoveByKeyword,
            Operation::RemoveAtIndex { .. } => OperationType::RemoveAtIndex,
            Operation::ChangeKeyword { .. } => OperationType::ChangeKeyword,
            Operation::ChangeValueByKeyword { .. } => OperationType::ChangeValueByKeyword,
            Operation::ChainRecords { .. } => OperationType::ChainRecords,
            Operation::ShiftTime { .. } => OperationType::ShiftTime,
            Operation::ComputeJd { .. } => OperationType::ComputeJd,
            Operation::ComputeHjd { .. } => OperationType::ComputeHjd,
        }
    }

    /// Whether a missing keyword or index skips the file instead of failing it.
    pub fn skip_if_missing(&self) -> bool {
        match self {
            Operation::AddToEnd { .. } | Operation::AddAtIndex { .. } => false,
            Operation::RemoveByKeyword { skip_if_missing, .. }
            | Operation::RemoveAtIndex { skip_if_missing, .. }
            | Operation::ChangeKeyword { skip_if_missing, .. }
            | Operation::ChangeValueByKeyword { skip_if_missing, .. }
            | Operation::ChainRecords { skip_if_missing, .. }
            | Operation::ShiftTime { skip_if_missing, .. }
            | Operation::ComputeJd { skip_if_missing, .. }
            | Operation::ComputeHjd { skip_if_missing, .. } => *skip_if_missing,
        }
    }

    /// Structural checks that need no file.
    fn validate(&self) -> Result<()> {
        match self {
            Operation::ChangeKeyword { from, to, .. } if from == to => Err(
                EditError::IllegalInputData(format!("cannot rename {from} to itself")),
            ),
            Operation::ChainRecords { parts, .. } if parts.is_empty() => Err(
                EditError::IllegalInputData("chain needs at least one part".to_string()),
            ),
            Operation::ShiftTime { shift, .. } => {
                if shift.is_zero() {
                    return Err(EditError::IllegalInputData(
                        "time shift amount is zero".to_string(),
                    ));
                }
                if shift.to_duration().is_none() {
                    return Err(EditError::IllegalInputData(format!(
                        "time shift {shift:?} is out of range"
                    )));
                }
                Ok(())
            }
            Operation::ComputeHjd { ra, dec, .. } => {
                if let RaSource::Explicit(ra) = ra {
                    ra.normalize()?;
                }
                if let DecSource::Explicit(dec) = dec {
                    dec.normalize()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// A complete edit request: one operation applied to a set of files.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub files: Vec<PathBuf>,
    pub operation: Operation,
}

impl OperationDescriptor {
    pub fn new(files: Vec<PathBuf>, operation: Operation) -> Self {
        Self { files, operation }
    }

    pub fn kind(&self) -> OperationType {
        self.operation.kind()
    }

    /// Reject malformed requests before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(EditError::IllegalInputData(
                "no files given".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.files.iter().find(|f| !seen.insert(*f)) {
            return Err(EditError::IllegalInputData(format!(
                "file {} listed more than once",
                dup.display()
            )));
        }
        self.operation.validate()
    }
}
