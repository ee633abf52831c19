//! Text encoding of CSV files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EntitlementError;

/// UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding used when writing CSV output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsvEncoding {
    /// Plain UTF-8.
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-8 prefixed with a byte order mark (opens cleanly in Excel).
    #[serde(rename = "utf-8-bom")]
    Utf8Bom,
}

impl CsvEncoding {
    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
        }
    }

    /// Returns the bytes written before any content.
    pub fn preamble(&self) -> &'static [u8] {
        match self {
            Self::Utf8 => b"",
            Self::Utf8Bom => UTF8_BOM,
        }
    }
}

impl fmt::Display for CsvEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CsvEncoding {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-8-bom" | "utf-8-sig" | "utf8-bom" => Ok(Self::Utf8Bom),
            other => Err(EntitlementError::Validation(format!(
                "unsupported encoding '{other}' (expected utf-8 or utf-8-bom)"
            ))),
        }
    }
}
