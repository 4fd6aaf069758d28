//! Runs one operation descriptor over its files and collects per-file outcomes.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{Engine, FileEdit};
use crate::error::{ErrorKind, Result};
use crate::operations::{OperationDescriptor, OperationType};
use crate::store::RecordStore;

/// How files are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    #[default]
    Sequential,
    Parallel { jobs: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Skipped { reason: String },
    Failed { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Failed { .. } => "failed",
        }
    }

    /// Reason or error message, empty for a success.
    pub fn detail(&self) -> &str {
        match self {
            Outcome::Success => "",
            Outcome::Skipped { reason } => reason,
            Outcome::Failed { message, .. } => message,
        }
    }
}

impl From<Result<FileEdit>> for Outcome {
    fn from(result: Result<FileEdit>) -> Self {
        match result {
            Ok(FileEdit::Persisted) => Outcome::Success,
            Ok(FileEdit::Skipped(reason)) => Outcome::Skipped { reason },
            Err(e) => Outcome::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcomes of one invocation, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub operation: OperationType,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn summary(&self) -> Summary {
        self.files.iter().fold(
            Summary {
                total: self.files.len(),
                ..Default::default()
            },
            |mut s, f| {
                match f.outcome {
                    Outcome::Success => s.succeeded += 1,
                    Outcome::Skipped { .. } => s.skipped += 1,
                    Outcome::Failed { .. } => s.failed += 1,
                }
                s
            },
        )
    }

    pub fn has_failures(&self) -> bool {
        self.summary().failed > 0
    }
}

/// Validate the descriptor, then edit every file independently.
///
/// Only a malformed descriptor is returned as an error; per-file failures
/// end up in the report.
pub fn run<S: RecordStore>(
    engine: &Engine<S>,
    descriptor: &OperationDescriptor,
    schedule: Schedule,
) -> Result<BatchReport> {
    descriptor.validate()?;
    let kind = descriptor.kind();
    info!(operation = %kind, files = descriptor.files.len(), "starting batch");

    let edit_one = |file: &PathBuf| {
        let outcome = Outcome::from(engine.edit_file(&descriptor.operation, file));
        match &outcome {
            Outcome::Failed { message, .. } => warn!(file = %file.display(), "failed: {message}"),
            other => info!(file = %file.display(), "{}", other.label()),
        }
        FileOutcome {
            file: file.clone(),
            outcome,
        }
    };

    let files: Vec<FileOutcome> = match schedule {
        Schedule::Parallel { jobs } if jobs > 1 => {
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| descriptor.files.par_iter().map(edit_one).collect()),
                Err(e) => {
                    warn!("thread pool unavailable ({e}), running sequentially");
                    descriptor.files.iter().map(edit_one).collect()
                }
            }
        }
        _ => descriptor.files.iter().map(edit_one).collect(),
    };

    let report = BatchReport {
        operation: kind,
        files,
    };
    let summary = report.summary();
    info!(
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    Ok(report)
}

/// Map an invocation result onto the process exit status:
/// `0` everything succeeded or was skipped, `1` a file failed, `2` the
/// invocation itself was rejected.
pub fn exit_code(result: &Result<BatchReport>) -> u8 {
    match result {
        Ok(report) if report.has_failures() => 1,
        Ok(_) => 0,
        Err(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use crate::engine::tests::{int, store_with, text};
    use crate::header::HeaderRecord;
    use crate::operations::Operation;
    use crate::store::MemoryStore;

    fn three_files(missing_in_second: bool) -> MemoryStore {
        let store = store_with(vec![text("OBJECT", "M1")]);
        let mut second = store.records("a.fits").unwrap();
        if missing_in_second {
            second.pop();
        }
        store.insert("b.fits", second);
        store.insert("c.fits", store.records("a.fits").unwrap());
        store
    }

    fn remove_object(skip: bool) -> OperationDescriptor {
        OperationDescriptor::new(
            vec!["a.fits".into(), "b.fits".into(), "c.fits".into()],
            Operation::RemoveByKeyword {
                keyword: "OBJECT".into(),
                skip_if_missing: skip,
            },
        )
    }

    #[test]
    fn test_one_failing_file_does_not_stop_the_batch() {
        let engine = Engine::new(three_files(true));
        let result = run(&engine, &remove_object(false), Schedule::Sequential);
        let report = result.as_ref().unwrap();

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.files[0].outcome, Outcome::Success);
        assert!(matches!(
            report.files[1].outcome,
            Outcome::Failed {
                kind: ErrorKind::KeywordNotFound,
                ..
            }
        ));
        assert_eq!(report.files[2].outcome, Outcome::Success);
        assert_eq!(exit_code(&result), 1);

        let store = engine.store();
        assert!(store.records("a.fits").unwrap().iter().all(|r| r.keyword() != "OBJECT"));
        assert!(store.records("c.fits").unwrap().iter().all(|r| r.keyword() != "OBJECT"));
    }

    #[test]
    fn test_skips_count_as_success_for_exit_code() {
        let engine = Engine::new(three_files(true));
        let result = run(&engine, &remove_object(true), Schedule::Sequential);
        let summary = result.as_ref().unwrap().summary();
        assert_eq!(
            summary,
            Summary {
                total: 3,
                succeeded: 2,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(exit_code(&result), 0);
    }

    #[test]
    fn test_invalid_descriptor_rejects_invocation() {
        let engine = Engine::new(three_files(false));
        let mut descriptor = remove_object(false);
        descriptor.files.push("a.fits".into());
        let result = run(&engine, &descriptor, Schedule::Sequential);
        assert!(matches!(result, Err(EditError::IllegalInputData(_))));
        assert_eq!(exit_code(&result), 2);
        assert!(engine.store().records("a.fits").unwrap().iter().any(|r| r.keyword() == "OBJECT"));
    }

    #[test]
    fn test_parallel_keeps_input_order() {
        let store = MemoryStore::new();
        let files: Vec<PathBuf> = (0..32).map(|i| PathBuf::from(format!("f{i:02}.fits"))).collect();
        for (i, file) in files.iter().enumerate() {
            let mut records = vec![HeaderRecord::new(
                "SIMPLE",
                Some(crate::header::HeaderValue::Logical(true)),
                None,
            )];
            if i % 3 != 0 {
                records.push(int("EXPTIME", i as i64));
            }
            store.insert(file.clone(), records);
        }
        let engine = Engine::new(store);
        let descriptor = OperationDescriptor::new(
            files.clone(),
            Operation::RemoveByKeyword {
                keyword: "EXPTIME".into(),
                skip_if_missing: true,
            },
        );

        let report = run(&engine, &descriptor, Schedule::Parallel { jobs: 4 }).unwrap();
        let order: Vec<_> = report.files.iter().map(|f| f.file.clone()).collect();
        assert_eq!(order, files);
        for (i, f) in report.files.iter().enumerate() {
            let expected = if i % 3 == 0 { "skipped" } else { "success" };
            assert_eq!(f.outcome.label(), expected, "{}", f.file.display());
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = FileOutcome {
            file: "a.fits".into(),
            outcome: Outcome::Failed {
                kind: ErrorKind::ValidationFailure,
                message: "bad".into(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["file"], "a.fits");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "validation_failure");
    }
}
