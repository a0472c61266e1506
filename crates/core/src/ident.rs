#![forbid(unsafe_code)]

use std::fmt;

pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A table or column name that is safe to splice into statement text.
///
/// Construction is the only validation point; once built, an identifier is
/// always rendered double-quoted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn try_new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate_identifier(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// SQLite folds identifier case; so does the catalog.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier must not be empty")]
    Empty,
    #[error("identifier is longer than {MAX_IDENTIFIER_LEN} bytes")]
    TooLong,
    #[error("identifier must start with an ASCII letter or '_'")]
    InvalidFirstChar,
    #[error("identifier contains {ch:?} at position {index}")]
    InvalidChar { ch: char, index: usize },
}

fn validate_identifier(value: &str) -> Result<(), IdentifierError> {
    let Some(first) = value.chars().next() else {
        return Err(IdentifierError::Empty);
    };
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong);
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(IdentifierError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate().skip(1) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            continue;
        }
        return Err(IdentifierError::InvalidChar { ch, index });
    }
    Ok(())
}
