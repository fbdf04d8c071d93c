//! Tag validation and normalization.
//!
//! Tags are stored lowercase. A valid tag:
//! - contains only ASCII letters, digits, underscores (`_`) and hyphens (`-`)
//! - starts with a letter
//! - is at most [`MAX_TAG_LEN`] characters long
//!
//! A document's tags form a set; [`normalize_tags`] removes duplicates while
//! keeping the first-seen order, which is also the display order.

use crate::error::{NotepadError, Result};
use std::fmt;

pub const MAX_TAG_LEN: usize = 48;

/// Error type for tag name validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    Empty,
    InvalidStart(char),
    InvalidCharacter(char),
    TooLong(usize),
}

impl fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag cannot be empty"),
            TagValidationError::InvalidStart(c) => {
                write!(f, "tag must start with a letter, found '{}'", c)
            }
            TagValidationError::InvalidCharacter(c) => {
                write!(f, "invalid character '{}' in tag", c)
            }
            TagValidationError::TooLong(n) => {
                write!(f, "tag is {} characters long (max {})", n, MAX_TAG_LEN)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

/// Validates an already-normalized (trimmed, lowercased) tag.
///
/// ```
/// use engpad::tags::validate_tag;
///
/// assert!(validate_tag("rust").is_ok());
/// assert!(validate_tag("todo-later").is_ok());
/// assert!(validate_tag("v2_notes").is_ok());
///
/// assert!(validate_tag("").is_err());
/// assert!(validate_tag("2fast").is_err());
/// assert!(validate_tag("a b").is_err());
/// ```
pub fn validate_tag(tag: &str) -> std::result::Result<(), TagValidationError> {
    let Some(first) = tag.chars().next() else {
        return Err(TagValidationError::Empty);
    };
    if !first.is_ascii_alphabetic() {
        return Err(TagValidationError::InvalidStart(first));
    }
    if let Some(bad) = tag
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(TagValidationError::InvalidCharacter(bad));
    }
    let len = tag.chars().count();
    if len > MAX_TAG_LEN {
        return Err(TagValidationError::TooLong(len));
    }
    Ok(())
}

/// Trim, lowercase, validate and deduplicate a list of tags.
pub fn normalize_tags<I, T>(tags: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for raw in tags {
        let tag = raw.as_ref().trim().to_lowercase();
        validate_tag(&tag)
            .map_err(|e| NotepadError::Validation(format!("{:?}: {}", raw.as_ref(), e)))?;
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_tags() {
        assert_eq!(validate_tag(""), Err(TagValidationError::Empty));
        assert_eq!(validate_tag("-x"), Err(TagValidationError::InvalidStart('-')));
        assert_eq!(
            validate_tag("a,b"),
            Err(TagValidationError::InvalidCharacter(','))
        );
        let long = "a".repeat(MAX_TAG_LEN + 1);
        assert_eq!(
            validate_tag(&long),
            Err(TagValidationError::TooLong(MAX_TAG_LEN + 1))
        );
    }

    #[test]
    fn normalizes_and_dedupes_in_order() {
        let tags = normalize_tags(["Work", " ideas ", "work", "draft"]).unwrap();
        assert_eq!(tags, vec!["work", "ideas", "draft"]);
    }

    #[test]
    fn normalize_reports_offending_tag() {
        let err = normalize_tags(["ok", "not ok"]).unwrap_err();
        assert!(matches!(err, NotepadError::Validation(ref msg) if msg.contains("not ok")));
    }

    #[test]
    fn empty_list_is_fine() {
        let none: [&str; 0] = [];
        assert!(normalize_tags(none).unwrap().is_empty());
    }
}
