//! Header records and their 80-column card form.

use std::fmt;

use serde::Serialize;

use crate::error::{EditError, Result};

/// FITS headers are organized in 80-character cards.
pub const CARD_SIZE: usize = 80;
pub const KEYWORD_WIDTH: usize = 8;
/// Width of the fixed-format value field (columns 11-30).
const VALUE_WIDTH: usize = 20;
/// Strings are padded to at least this many characters inside the quotes.
const MIN_STRING_WIDTH: usize = 8;

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Integer(i64),
    Real(f64),
    Logical(bool),
    Text(String),
}

/// Declared kind of a value supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ValueKind {
    Integer,
    Real,
    Logical,
    #[value(alias = "string")]
    Text,
}

impl ValueKind {
    /// Parse caller input into a value of this kind.
    pub fn parse(self, input: &str) -> Result<HeaderValue> {
        let bad = || EditError::IllegalInputData(format!("'{input}' is not a valid {self:?} value"));
        match self {
            ValueKind::Integer => input.trim().parse().map(HeaderValue::Integer).map_err(|_| bad()),
            ValueKind::Real => match input.trim().replace(['D', 'd'], "E").parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(HeaderValue::Real(v)),
                _ => Err(bad()),
            },
            ValueKind::Logical => match input.trim().to_ascii_uppercase().as_str() {
                "T" | "TRUE" => Ok(HeaderValue::Logical(true)),
                "F" | "FALSE" => Ok(HeaderValue::Logical(false)),
                _ => Err(bad()),
            },
            ValueKind::Text => Ok(HeaderValue::Text(input.to_string())),
        }
    }
}

impl HeaderValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Real(f) => Some(*f),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Plain text form used when a value is concatenated into another one.
    pub fn to_text(&self) -> String {
        match self {
            HeaderValue::Text(s) => s.clone(),
            HeaderValue::Integer(i) => i.to_string(),
            HeaderValue::Real(f) => real_repr(*f),
            HeaderValue::Logical(b) => if *b { "T" } else { "F" }.to_string(),
        }
    }

    /// Form written into the value field of a card.
    fn card_field(&self) -> String {
        match self {
            HeaderValue::Text(s) => {
                let quoted = format!("'{:<MIN_STRING_WIDTH$}'", s.replace('\'', "''"));
                format!("{quoted:<VALUE_WIDTH$}")
            }
            HeaderValue::Integer(i) => format!("{:>VALUE_WIDTH$}", i),
            HeaderValue::Real(f) => format!("{:>VALUE_WIDTH$}", real_repr(*f)),
            HeaderValue::Logical(b) => format!("{:>VALUE_WIDTH$}", if *b { "T" } else { "F" }),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Real number text that always re-reads as a real and fits the value field.
pub fn real_repr(value: f64) -> String {
    let plain = value.to_string();
    let plain = if plain.contains(['.', 'e', 'E']) || !value.is_finite() {
        plain
    } else {
        format!("{plain}.0")
    };
    if plain.len() <= VALUE_WIDTH {
        plain
    } else {
        format!("{value:E}")
    }
}

/// One keyword/value/comment record of a header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderRecord {
    keyword: String,
    value: Option<HeaderValue>,
    comment: Option<String>,
    /// Card text as read from disk, reused verbatim until the record changes.
    #[serde(skip)]
    original: Option<String>,
}

impl HeaderRecord {
    pub fn new(
        keyword: impl Into<String>,
        value: Option<HeaderValue>,
        comment: Option<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            value,
            comment,
            original: None,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn value(&self) -> Option<&HeaderValue> {
        self.value.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn with_keyword(&self, keyword: impl Into<String>) -> Self {
        Self::new(keyword, self.value.clone(), self.comment.clone())
    }

    /// Replace the value. A `None` comment keeps the current one.
    pub fn with_value(&self, value: HeaderValue, comment: Option<String>) -> Self {
        Self::new(
            self.keyword.clone(),
            Some(value),
            comment.or_else(|| self.comment.clone()),
        )
    }

    pub fn is_commentary(&self) -> bool {
        matches!(self.keyword.as_str(), "COMMENT" | "HISTORY" | "")
    }

    /// Parse one 80-column card.
    pub fn parse_card(card: &str) -> Result<Self> {
        if card.len() != CARD_SIZE || !card.is_ascii() {
            return Err(EditError::Parse(format!(
                "header card is not 80 ASCII characters: '{}'",
                card.trim_end()
            )));
        }

        let keyword = card[..KEYWORD_WIDTH].trim_end().to_string();
        let original = Some(card.to_string());

        if &card[KEYWORD_WIDTH..KEYWORD_WIDTH + 2] != "= " {
            // COMMENT, HISTORY, blank and other cards without a value indicator
            let text = card[KEYWORD_WIDTH..].trim_end();
            return Ok(Self {
                keyword,
                value: None,
                comment: (!text.is_empty()).then(|| text.to_string()),
                original,
            });
        }

        let (value, comment) = parse_value_field(&card[KEYWORD_WIDTH + 2..]);
        Ok(Self {
            keyword,
            value,
            comment,
            original,
        })
    }

    /// Render as an 80-column card.
    pub fn to_card(&self) -> Result<String> {
        if let Some(original) = &self.original {
            return Ok(original.clone());
        }

        let mut card = format!("{:<KEYWORD_WIDTH$}", self.keyword);
        if self.is_commentary() && self.value.is_none() {
            if let Some(text) = &self.comment {
                card.push_str(text);
            }
        } else {
            card.push_str("= ");
            let field = match &self.value {
                Some(value) => value.card_field(),
                None => " ".repeat(VALUE_WIDTH),
            };
            match &self.comment {
                Some(comment) => {
                    let tail = format!(" / {comment}");
                    match &self.value {
                        // Drop the cosmetic string padding before giving up.
                        Some(HeaderValue::Text(s))
                            if card.len() + field.len() + tail.len() > CARD_SIZE =>
                        {
                            card.push_str(&format!("'{}'", s.replace('\'', "''")));
                        }
                        _ => card.push_str(&field),
                    }
                    card.push_str(&tail);
                }
                None => card.push_str(&field),
            }
        }

        if card.len() > CARD_SIZE {
            return Err(EditError::ValidationFailure(format!(
                "record {} does not fit in an 80-column card",
                self.keyword
            )));
        }
        Ok(format!("{card:<CARD_SIZE$}"))
    }
}

/// Split the text after `= ` into a value and an optional comment.
fn parse_value_field(field: &str) -> (Option<HeaderValue>, Option<String>) {
    let trimmed = field.trim_start();

    if let Some(body) = trimmed.strip_prefix('\'') {
        let mut text = String::new();
        let mut chars = body.char_indices().peekable();
        let mut rest = "";
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if let Some((_, '\'')) = chars.peek() {
                    text.push('\'');
                    chars.next();
                    continue;
                }
                rest = &body[i + 1..];
                break;
            }
            text.push(c);
        }
        let comment = split_comment(rest).1;
        return (Some(HeaderValue::Text(text.trim_end().to_string())), comment);
    }

    let (value_str, comment) = split_comment(trimmed);
    let value_str = value_str.trim();
    let value = match value_str {
        "" => None,
        "T" => Some(HeaderValue::Logical(true)),
        "F" => Some(HeaderValue::Logical(false)),
        _ => {
            if let Ok(i) = value_str.parse::<i64>() {
                Some(HeaderValue::Integer(i))
            } else if let Ok(f) = value_str.replace(['D', 'd'], "E").parse::<f64>() {
                Some(HeaderValue::Real(f))
            } else {
                // Complex and other exotic values are kept as raw text.
                Some(HeaderValue::Text(value_str.to_string()))
            }
        }
    };
    (value, comment)
}

fn split_comment(text: &str) -> (&str, Option<String>) {
    match text.find('/') {
        Some(pos) => {
            let comment = text[pos + 1..].trim();
            (&text[..pos], (!comment.is_empty()).then(|| comment.to_string()))
        }
        None => (text, None),
    }
}
