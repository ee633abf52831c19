//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use svctag_core::{BatchResult, BatchSummary, TagOutcome};

/// JSON output for a batch run: counts first, then outcomes.
#[derive(Debug, Serialize)]
pub struct BatchOutput<'a> {
    #[serde(flatten)]
    summary: BatchSummary,
    outcomes: &'a [TagOutcome],
}

impl<'a> BatchOutput<'a> {
    /// Borrows the outcomes of `result`.
    pub fn new(result: &'a BatchResult) -> Self {
        Self {
            summary: result.summary(),
            outcomes: result.outcomes(),
        }
    }
}

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a batch result with its summary counts.
    pub fn format_batch(&self, result: &BatchResult) -> Result<String> {
        self.format(&BatchOutput::new(result))
    }
}
