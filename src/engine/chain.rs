use crate::error::{EditError, Result};
use crate::header::HeaderValue;
use crate::operations::ChainValue;
use crate::store::RecordContainer;
use crate::validate::{validate_target_keyword, validate_text_value};

use super::{upsert, Mutation};

/// Concatenate constants and referenced values into one text record.
///
/// Every reference is resolved before anything is planned, so one missing
/// keyword fails (or skips) the file as a whole.
pub(super) fn plan_chain<C: RecordContainer>(
    container: &C,
    keyword: &str,
    parts: &[ChainValue],
    comment: Option<&str>,
    update_if_exists: bool,
) -> Result<Vec<Mutation>> {
    validate_target_keyword(keyword)?;

    let mut joined = String::new();
    for part in parts {
        match part {
            ChainValue::Constant(text) => joined.push_str(text),
            ChainValue::KeywordRef(reference) => {
                let record = container
                    .record(reference)
                    .ok_or_else(|| EditError::KeywordNotFound(reference.clone()))?;
                if let Some(value) = record.value() {
                    joined.push_str(&value.to_text());
                }
            }
        }
    }

    validate_text_value(keyword, &joined, comment)?;
    upsert(
        container,
        keyword,
        HeaderValue::Text(joined),
        comment.map(str::to_string),
        update_if_exists,
    )
}
