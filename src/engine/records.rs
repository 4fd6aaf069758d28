//! Add, remove, rename and change-value handlers.

use crate::error::{EditError, Result};
use crate::header::{HeaderRecord, HeaderValue};
use crate::store::{Position, RecordContainer};
use crate::validate::{
    is_mandatory, validate_insert_index, validate_record, validate_remove_index,
    validate_target_keyword,
};

use super::{upsert, Mutation};

pub(super) fn plan_add<C: RecordContainer>(
    container: &C,
    record: &HeaderRecord,
    position: Position,
    update_if_exists: bool,
) -> Result<Vec<Mutation>> {
    validate_record(record)?;

    // Commentary cards may repeat; everything else is unique per header.
    if !record.is_commentary() && container.position(record.keyword()).is_some() {
        return match record.value() {
            Some(value) => upsert(
                container,
                record.keyword(),
                value.clone(),
                record.comment().map(str::to_string),
                update_if_exists,
            ),
            None if update_if_exists => {
                let index = container.position(record.keyword()).unwrap_or_default();
                Ok(vec![Mutation::Replace(index, record.clone())])
            }
            None => Err(EditError::ValidationFailure(format!(
                "keyword {} already exists",
                record.keyword()
            ))),
        };
    }

    if let Position::Index(index) = position {
        validate_insert_index(index, container.len())?;
        if let Some(next) = container.record_at(index) {
            if is_mandatory(next.keyword()) {
                return Err(EditError::ValidationFailure(format!(
                    "cannot insert at {index}, before mandatory keyword {}",
                    next.keyword()
                )));
            }
        }
    }
    Ok(vec![Mutation::Insert(position, record.clone())])
}

pub(super) fn plan_remove<C: RecordContainer>(container: &C, keyword: &str) -> Result<Vec<Mutation>> {
    validate_target_keyword(keyword)?;
    let index = container
        .position(keyword)
        .ok_or_else(|| EditError::KeywordNotFound(keyword.to_string()))?;
    Ok(vec![Mutation::Remove(index)])
}

pub(super) fn plan_remove_at<C: RecordContainer>(container: &C, index: usize) -> Result<Vec<Mutation>> {
    validate_remove_index(index, container.len())?;
    if let Some(record) = container.record_at(index) {
        if is_mandatory(record.keyword()) {
            return Err(EditError::ValidationFailure(format!(
                "record {index} is mandatory keyword {}",
                record.keyword()
            )));
        }
    }
    Ok(vec![Mutation::Remove(index)])
}

pub(super) fn plan_rename<C: RecordContainer>(container: &C, from: &str, to: &str) -> Result<Vec<Mutation>> {
    validate_target_keyword(from)?;
    validate_target_keyword(to)?;
    let index = container
        .position(from)
        .ok_or_else(|| EditError::KeywordNotFound(from.to_string()))?;
    if container.position(to).is_some() {
        return Err(EditError::ValidationFailure(format!(
            "cannot rename {from}: keyword {to} already exists"
        )));
    }
    let renamed = container.records()[index].with_keyword(to);
    validate_record(&renamed)?;
    Ok(vec![Mutation::Replace(index, renamed)])
}

pub(super) fn plan_change_value<C: RecordContainer>(
    container: &C,
    keyword: &str,
    value: &HeaderValue,
    comment: Option<&str>,
) -> Result<Vec<Mutation>> {
    validate_target_keyword(keyword)?;
    let index = container
        .position(keyword)
        .ok_or_else(|| EditError::KeywordNotFound(keyword.to_string()))?;
    let updated = container.records()[index].with_value(value.clone(), comment.map(str::to_string));
    validate_record(&updated)?;
    Ok(vec![Mutation::Replace(index, updated)])
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::super::tests::{int, keywords, store_with, text};
    use super::super::{Engine, FileEdit};
    use crate::error::EditError;
    use crate::header::{HeaderRecord, HeaderValue};
    use crate::operations::Operation;

    fn run(engine: &Engine<crate::store::MemoryStore>, op: Operation) -> crate::error::Result<FileEdit> {
        engine.edit_file(&op, Path::new("a.fits"))
    }

    fn value_of(engine: &Engine<crate::store::MemoryStore>, keyword: &str) -> Option<HeaderValue> {
        engine
            .store()
            .records("a.fits")
            .unwrap()
            .into_iter()
            .find(|r| r.keyword() == keyword)
            .and_then(|r| r.value().cloned())
    }

    #[test]
    fn test_add_to_end() {
        let engine = Engine::new(store_with(vec![]));
        let edit = run(
            &engine,
            Operation::AddToEnd {
                record: text("OBJECT", "M42"),
                update_if_exists: false,
            },
        )
        .unwrap();
        assert_eq!(edit, FileEdit::Persisted);
        assert_eq!(keywords(engine.store()).last().map(String::as_str), Some("OBJECT"));
    }

    #[test]
    fn test_add_existing_updates_only_with_switch() {
        let engine = Engine::new(store_with(vec![int("EXPTIME", 10)]));
        let add = |update| Operation::AddToEnd {
            record: int("EXPTIME", 30),
            update_if_exists: update,
        };
        assert!(matches!(run(&engine, add(false)), Err(EditError::ValidationFailure(_))));
        run(&engine, add(true)).unwrap();
        assert_eq!(value_of(&engine, "EXPTIME"), Some(HeaderValue::Integer(30)));
        assert_eq!(keywords(engine.store()).len(), 6);
    }

    #[test]
    fn test_history_cards_may_repeat() {
        let engine = Engine::new(store_with(vec![]));
        for _ in 0..2 {
            run(
                &engine,
                Operation::AddToEnd {
                    record: HeaderRecord::new("HISTORY", None, Some("dark subtracted".into())),
                    update_if_exists: false,
                },
            )
            .unwrap();
        }
        assert_eq!(keywords(engine.store()).len(), 7);
    }

    #[test]
    fn test_add_at_index() {
        let engine = Engine::new(store_with(vec![int("A", 1), int("C", 3)]));
        run(
            &engine,
            Operation::AddAtIndex {
                record: int("B", 2),
                index: 6,
                update_if_exists: false,
            },
        )
        .unwrap();
        assert_eq!(&keywords(engine.store())[5..], ["A", "B", "C"]);

        let past_end = Operation::AddAtIndex {
            record: int("D", 4),
            index: 99,
            update_if_exists: false,
        };
        assert!(matches!(
            run(&engine, past_end),
            Err(EditError::IndexOutOfRange { index: 99, len: 8 })
        ));
    }

    #[test]
    fn test_add_before_mandatory_rejected() {
        let engine = Engine::new(store_with(vec![]));
        let op = Operation::AddAtIndex {
            record: int("A", 1),
            index: 0,
            update_if_exists: false,
        };
        assert!(matches!(run(&engine, op), Err(EditError::ValidationFailure(_))));
    }

    #[test]
    fn test_add_rejects_oversized_comment() {
        let engine = Engine::new(store_with(vec![]));
        let op = Operation::AddToEnd {
            record: HeaderRecord::new("A", Some(HeaderValue::Integer(1)), Some("x".repeat(48))),
            update_if_exists: false,
        };
        assert!(matches!(run(&engine, op), Err(EditError::ValidationFailure(_))));
    }

    #[test]
    fn test_remove_by_keyword_and_index() {
        let engine = Engine::new(store_with(vec![int("A", 1), int("B", 2)]));
        run(
            &engine,
            Operation::RemoveByKeyword {
                keyword: "A".into(),
                skip_if_missing: false,
            },
        )
        .unwrap();
        run(
            &engine,
            Operation::RemoveAtIndex {
                index: 5,
                skip_if_missing: false,
            },
        )
        .unwrap();
        assert_eq!(keywords(engine.store()).len(), 5);
    }

    #[test]
    fn test_remove_at_index_out_of_range() {
        let engine = Engine::new(store_with(vec![]));
        let op = |skip| Operation::RemoveAtIndex {
            index: 5,
            skip_if_missing: skip,
        };
        assert!(matches!(
            run(&engine, op(false)),
            Err(EditError::IndexOutOfRange { index: 5, len: 5 })
        ));
        assert!(matches!(run(&engine, op(true)), Ok(FileEdit::Skipped(_))));
    }

    #[test]
    fn test_remove_mandatory_by_index_rejected() {
        let engine = Engine::new(store_with(vec![]));
        let op = Operation::RemoveAtIndex {
            index: 1,
            skip_if_missing: true,
        };
        assert!(matches!(run(&engine, op), Err(EditError::ValidationFailure(_))));
    }

    #[test]
    fn test_rename_keeps_value_and_comment() {
        let engine = Engine::new(store_with(vec![HeaderRecord::new(
            "EXPOSURE",
            Some(HeaderValue::Real(120.5)),
            Some("seconds".into()),
        )]));
        run(
            &engine,
            Operation::ChangeKeyword {
                from: "EXPOSURE".into(),
                to: "EXPTIME".into(),
                skip_if_missing: false,
            },
        )
        .unwrap();
        let records = engine.store().records("a.fits").unwrap();
        let renamed = &records[5];
        assert_eq!(renamed.keyword(), "EXPTIME");
        assert_eq!(renamed.value(), Some(&HeaderValue::Real(120.5)));
        assert_eq!(renamed.comment(), Some("seconds"));
    }

    #[test]
    fn test_rename_onto_existing_keyword_rejected() {
        let engine = Engine::new(store_with(vec![int("A", 1), int("B", 2)]));
        let op = Operation::ChangeKeyword {
            from: "A".into(),
            to: "B".into(),
            skip_if_missing: true,
        };
        assert!(matches!(run(&engine, op), Err(EditError::ValidationFailure(_))));
    }

    #[test]
    fn test_rename_to_mandatory_rejected() {
        let engine = Engine::new(store_with(vec![int("A", 1)]));
        let op = Operation::ChangeKeyword {
            from: "A".into(),
            to: "EXTEND".into(),
            skip_if_missing: false,
        };
        assert!(matches!(run(&engine, op), Err(EditError::ValidationFailure(_))));
    }

    #[test]
    fn test_change_value_keeps_comment_unless_given() {
        let engine = Engine::new(store_with(vec![HeaderRecord::new(
            "GAIN",
            Some(HeaderValue::Integer(100)),
            Some("camera gain".into()),
        )]));
        let change = |comment: Option<&str>| Operation::ChangeValueByKeyword {
            keyword: "GAIN".into(),
            value: HeaderValue::Integer(120),
            comment: comment.map(str::to_string),
            skip_if_missing: false,
        };
        run(&engine, change(None)).unwrap();
        let records = engine.store().records("a.fits").unwrap();
        assert_eq!(records[5].value(), Some(&HeaderValue::Integer(120)));
        assert_eq!(records[5].comment(), Some("camera gain"));

        run(&engine, change(Some("e-/ADU"))).unwrap();
        let records = engine.store().records("a.fits").unwrap();
        assert_eq!(records[5].comment(), Some("e-/ADU"));
    }

    #[test]
    fn test_change_missing_value() {
        let engine = Engine::new(store_with(vec![]));
        let change = |skip| Operation::ChangeValueByKeyword {
            keyword: "GAIN".into(),
            value: HeaderValue::Integer(1),
            comment: None,
            skip_if_missing: skip,
        };
        assert!(matches!(run(&engine, change(false)), Err(EditError::KeywordNotFound(_))));
        assert!(matches!(run(&engine, change(true)), Ok(FileEdit::Skipped(_))));
    }
}
