//! Record-format rules checked before any header mutation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EditError, Result};
use crate::header::{HeaderRecord, HeaderValue, CARD_SIZE, KEYWORD_WIDTH};

pub const MAX_COMMENT_LEN: usize = 47;
pub const MAX_TEXT_LEN: usize = 68;
pub const MAX_TEXT_WITH_COMMENT_LEN: usize = 65;
const MAX_COMMENTARY_LEN: usize = CARD_SIZE - KEYWORD_WIDTH;

static KEYWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_-]{1,8}$").expect("valid keyword regex"));

/// Structural keywords that define the shape of the header/data unit.
static MANDATORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(SIMPLE|BITPIX|NAXIS[0-9]{0,3}|EXTEND|XTENSION|PCOUNT|GCOUNT|GROUPS|TFIELDS|END)$")
        .expect("valid mandatory keyword regex")
});

pub fn is_mandatory(keyword: &str) -> bool {
    MANDATORY_PATTERN.is_match(keyword)
}

pub fn validate_keyword(keyword: &str) -> Result<()> {
    if KEYWORD_PATTERN.is_match(keyword) {
        Ok(())
    } else {
        Err(EditError::ValidationFailure(format!(
            "keyword '{keyword}' must be 1-8 characters of A-Z, 0-9, '_' or '-'"
        )))
    }
}

/// Keyword checks for a record about to be created, changed or removed.
pub fn validate_target_keyword(keyword: &str) -> Result<()> {
    validate_keyword(keyword)?;
    if is_mandatory(keyword) {
        return Err(EditError::ValidationFailure(format!(
            "mandatory keyword {keyword} cannot be edited"
        )));
    }
    Ok(())
}

fn ensure_printable(what: &str, text: &str) -> Result<()> {
    if text.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        Ok(())
    } else {
        Err(EditError::ValidationFailure(format!(
            "{what} contains characters outside printable ASCII"
        )))
    }
}

/// Length and character-set limits of a record. Oversized input is an
/// error, it is never truncated.
pub fn validate_record(record: &HeaderRecord) -> Result<()> {
    validate_target_keyword(record.keyword())?;

    let comment_len = match record.comment() {
        Some(comment) => {
            ensure_printable("comment", comment)?;
            comment.len()
        }
        None => 0,
    };

    if record.is_commentary() && record.value().is_none() {
        if comment_len > MAX_COMMENTARY_LEN {
            return Err(EditError::ValidationFailure(format!(
                "{} text is {comment_len} characters, limit is {MAX_COMMENTARY_LEN}",
                record.keyword()
            )));
        }
        return Ok(());
    }

    if comment_len > MAX_COMMENT_LEN {
        return Err(EditError::ValidationFailure(format!(
            "comment of {} is {comment_len} characters, limit is {MAX_COMMENT_LEN}",
            record.keyword()
        )));
    }

    if let Some(HeaderValue::Text(text)) = record.value() {
        validate_text_value(record.keyword(), text, record.comment())?;
    }
    Ok(())
}

/// Limits apply to the text as written on the card, with each `'` doubled.
pub fn validate_text_value(keyword: &str, text: &str, comment: Option<&str>) -> Result<()> {
    ensure_printable("value", text)?;
    let written = text.len() + text.matches('\'').count();
    if written > MAX_TEXT_LEN {
        return Err(EditError::ValidationFailure(format!(
            "value of {keyword} is {written} characters on the card, limit is {MAX_TEXT_LEN}"
        )));
    }
    if let Some(comment) = comment {
        let joint = written + comment.len();
        if joint > MAX_TEXT_WITH_COMMENT_LEN {
            return Err(EditError::ValidationFailure(format!(
                "value and comment of {keyword} are {joint} characters together, limit is {MAX_TEXT_WITH_COMMENT_LEN}"
            )));
        }
    }
    Ok(())
}

/// Insert positions run from 0 to `len` inclusive.
pub fn validate_insert_index(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(EditError::IndexOutOfRange { index, len });
    }
    Ok(())
}

pub fn validate_remove_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(EditError::IndexOutOfRange { index, len });
    }
    Ok(())
}
