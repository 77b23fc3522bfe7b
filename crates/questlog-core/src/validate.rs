//! Typed, validated command arguments.
//!
//! The command layer turns raw text into these values before anything
//! reaches the store, so the store never sees an empty name or a
//! non-positive point value.

use std::fmt;
use thiserror::Error;

/// Quote characters stripped from both ends of a challenge name.
/// Includes the typographic quotes mobile keyboards substitute for `"`.
const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’'];

/// Bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("challenge name is empty")]
    EmptyName,

    #[error("points must be a whole number, got '{0}'")]
    InvalidPoints(String),

    #[error("points must be greater than zero, got {0}")]
    NonPositivePoints(i64),
}

/// A trimmed, non-empty challenge name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeName(String);

impl ChallengeName {
    /// Trim whitespace and surrounding quotes; reject what is left if empty.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let name = raw.trim().trim_matches(QUOTES).trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A strictly positive point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Points(i64);

impl Points {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositivePoints(value));
        }
        Ok(Self(value))
    }

    /// Parse a user-typed point value.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidPoints(trimmed.to_string()))?;
        Self::new(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a comma-separated list of names, validating each one.
///
/// Empty segments (`"a,,b"`, trailing commas) are skipped rather than
/// rejected; an input with no usable name at all is `EmptyName`.
pub fn parse_name_list(raw: &str) -> Result<Vec<ChallengeName>, ValidationError> {
    let names: Vec<ChallengeName> = raw
        .split(',')
        .filter_map(|part| ChallengeName::parse(part).ok())
        .collect();
    if names.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(names)
}
