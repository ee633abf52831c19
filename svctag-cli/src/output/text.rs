//! Text output formatting with colors.

use chrono::{DateTime, Utc};
use svctag_core::{AssetEntitlements, BatchResult, EntitlementRecord};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    now: DateTime<Utc>,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            now: Utc::now(),
        }
    }

    /// Evaluates coverage as of `now` instead of the current time.
    #[cfg(test)]
    fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Formats an asset and its entitlements as a table.
    pub fn format_asset(&self, data: &AssetEntitlements) -> String {
        let asset = &data.asset;
        let mut lines = vec![
            format!(
                "{} ({})",
                self.bold(asset.service_tag.as_str()),
                asset.product_line_description
            ),
            format!(
                "Shipped: {} to {}",
                format_date(asset.ship_date),
                asset.country_code
            ),
        ];

        let coverage = match data.coverage_end() {
            Some(end) if data.is_covered_at(self.now) => {
                self.green(&format!("active until {}", format_date(end)))
            }
            Some(end) => self.red(&format!("expired {}", format_date(end))),
            None => self.yellow("no entitlements"),
        };
        lines.push(format!("Coverage: {coverage}"));

        if !data.entitlements.is_empty() {
            lines.push(String::new());
            lines.push(self.dim(&format!(
                "{:<12} {:<10} {:<10} {:<10} {}",
                "Item", "Start", "End", "Type", "Service Level"
            )));
            for entitlement in &data.entitlements {
                lines.push(self.format_entitlement(entitlement));
            }
        }

        lines.join("\n")
    }

    fn format_entitlement(&self, entitlement: &EntitlementRecord) -> String {
        let line = format!(
            "{:<12} {:<10} {:<10} {:<10} {} ({})",
            entitlement.item_number,
            format_date(entitlement.start_date),
            format_date(entitlement.end_date),
            entitlement.entitlement_type,
            entitlement.service_level_description,
            entitlement.service_level_code,
        );
        if entitlement.is_active_at(self.now) {
            line
        } else {
            self.dim(&line)
        }
    }

    /// Formats a batch summary followed by one line per failure.
    pub fn format_batch(&self, result: &BatchResult) -> String {
        let mut lines = vec![format!(
            "Processed: {}  Successful: {}  Failed: {}",
            result.processed(),
            self.green(&result.successful().to_string()),
            if result.failed() > 0 {
                self.red(&result.failed().to_string())
            } else {
                result.failed().to_string()
            },
        )];

        if result.was_cancelled() {
            lines.push(self.yellow("Cancelled before all rows were processed"));
        }

        for (outcome, failure) in result.failures() {
            let location = outcome
                .row
                .map_or_else(String::new, |row| format!("row {row}: "));
            lines.push(format!(
                "  {}{} - {} {}",
                location,
                outcome.input,
                self.red(failure.kind.as_str()),
                self.dim(&failure.reason)
            ));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Tests
// ============================================================================
