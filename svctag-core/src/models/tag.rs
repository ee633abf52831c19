//! Service tag identifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EntitlementError;

/// Longest service tag accepted.
pub const MAX_TAG_LEN: usize = 20;

/// A validated, upper-cased service tag.
///
/// Construction trims surrounding whitespace and requires 1 to
/// [`MAX_TAG_LEN`] ASCII alphanumeric characters. Interior whitespace,
/// punctuation, and non-ASCII characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ServiceTag(String);

impl ServiceTag {
    /// Parses and normalizes a raw tag.
    pub fn parse(raw: &str) -> Result<Self, EntitlementError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(EntitlementError::Validation(
                "service tag is empty".to_string(),
            ));
        }

        if trimmed.len() > MAX_TAG_LEN {
            return Err(EntitlementError::Validation(format!(
                "service tag '{trimmed}' is longer than {MAX_TAG_LEN} characters"
            )));
        }

        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(EntitlementError::Validation(format!(
                "service tag '{trimmed}' contains invalid character {bad:?}"
            )));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the normalized tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ServiceTag {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ServiceTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
