//! CSV export of batch results.
//!
//! One row is written per entitlement of every successful outcome, in
//! outcome order. Failed outcomes contribute no rows; use
//! [`write_failures_csv`] for a separate failure report. The header is
//! always written, even when there are no rows.

use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;
use svctag_core::{AssetEntitlements, AssetRecord, BatchResult, CsvEncoding, InventoryFields};
use tracing::debug;

use crate::error::ExportError;

/// Entitlement columns, in output order.
pub const ENTITLEMENT_COLUMNS: &[&str] = &[
    "itemNumber",
    "startDate",
    "endDate",
    "entitlementType",
    "serviceLevelCode",
    "serviceLevelDescription",
    "serviceLevelGroup",
];

/// Asset columns prefixed by [`ExportLayout::Detailed`].
pub const ASSET_COLUMNS: &[&str] = &[
    "name",
    "id",
    "serviceTag",
    "orderBuid",
    "shipDate",
    "productCode",
    "localChannel",
    "productId",
    "productLineDescription",
    "productFamily",
    "systemDescription",
    "productLobDescription",
    "countryCode",
    "duplicated",
    "invalid",
];

/// Input inventory columns appended by [`ExportLayout::Detailed`].
pub const INVENTORY_COLUMNS: &[&str] = &["warranty", "acquisition_date", "warranty_expiry_date"];

/// Failure report columns.
pub const FAILURE_COLUMNS: &[&str] = &["row", "serviceTag", "name", "kind", "reason"];

// ============================================================================
// Layout
// ============================================================================

/// Which columns an export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportLayout {
    /// Entitlement columns only.
    #[default]
    Default,
    /// Asset columns, then entitlement columns, then the inventory columns
    /// carried from the input file.
    Detailed,
}

// ============================================================================
// Exporter
// ============================================================================

/// Writes entitlement rows as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvExporter {
    delimiter: u8,
    encoding: CsvEncoding,
    layout: ExportLayout,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    /// Creates an exporter: comma, UTF-8, default layout.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            encoding: CsvEncoding::default(),
            layout: ExportLayout::default(),
        }
    }

    /// Sets the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the output encoding.
    pub fn with_encoding(mut self, encoding: CsvEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the layout.
    pub fn with_layout(mut self, layout: ExportLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the header row for the current layout.
    pub fn headers(&self) -> Vec<&'static str> {
        match self.layout {
            ExportLayout::Default => ENTITLEMENT_COLUMNS.to_vec(),
            ExportLayout::Detailed => ASSET_COLUMNS
                .iter()
                .chain(ENTITLEMENT_COLUMNS)
                .chain(INVENTORY_COLUMNS)
                .copied()
                .collect(),
        }
    }

    /// Renders a batch result into a buffer.
    pub fn to_csv(&self, result: &BatchResult) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, result)?;
        Ok(buf)
    }

    /// Writes a batch result to `out`.
    ///
    /// # Errors
    ///
    /// Fails only if `out` does.
    pub fn write_csv<W: Write>(&self, out: W, result: &BatchResult) -> Result<(), ExportError> {
        let mut writer = self.open(out)?;
        let mut rows = 0;
        for (outcome, data) in result.successes() {
            rows += self.write_asset_rows(
                &mut writer,
                data,
                outcome.name.as_deref(),
                &outcome.inventory,
            )?;
        }
        writer.flush()?;
        debug!(rows, layout = ?self.layout, "Exported entitlements");
        Ok(())
    }

    /// Renders one lookup payload into a buffer.
    pub fn asset_to_csv(
        &self,
        data: &AssetEntitlements,
        name: Option<&str>,
    ) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        self.write_asset_csv(&mut buf, data, name)?;
        Ok(buf)
    }

    /// Writes one lookup payload to `out`, header included.
    pub fn write_asset_csv<W: Write>(
        &self,
        out: W,
        data: &AssetEntitlements,
        name: Option<&str>,
    ) -> Result<(), ExportError> {
        let mut writer = self.open(out)?;
        self.write_asset_rows(&mut writer, data, name, &InventoryFields::default())?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the preamble and header and returns the CSV writer.
    fn open<W: Write>(&self, mut out: W) -> Result<csv::Writer<W>, ExportError> {
        out.write_all(self.encoding.preamble())?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);
        writer.write_record(self.headers())?;
        Ok(writer)
    }

    fn write_asset_rows<W: Write>(
        &self,
        writer: &mut csv::Writer<W>,
        data: &AssetEntitlements,
        name: Option<&str>,
        inventory: &InventoryFields,
    ) -> Result<usize, ExportError> {
        let (prefix, suffix) = match self.layout {
            ExportLayout::Default => (Vec::new(), Vec::new()),
            ExportLayout::Detailed => (
                asset_fields(&data.asset, name),
                [
                    &inventory.warranty,
                    &inventory.acquisition_date,
                    &inventory.warranty_expiry_date,
                ]
                .into_iter()
                .map(|v| v.clone().unwrap_or_default())
                .collect(),
            ),
        };

        for entitlement in &data.entitlements {
            let mut record = prefix.clone();
            record.extend([
                entitlement.item_number.clone(),
                format_date(entitlement.start_date),
                format_date(entitlement.end_date),
                entitlement.entitlement_type.clone(),
                entitlement.service_level_code.clone(),
                entitlement.service_level_description.clone(),
                entitlement.service_level_group.to_string(),
            ]);
            record.extend(suffix.iter().cloned());
            writer.write_record(&record)?;
        }
        Ok(data.entitlements.len())
    }
}

// ============================================================================
// Failure Report
// ============================================================================

/// Writes one row per failed outcome: `row, serviceTag, name, kind, reason`.
pub fn write_failures_csv<W: Write>(
    out: W,
    result: &BatchResult,
    delimiter: u8,
) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    writer.write_record(FAILURE_COLUMNS)?;
    for (outcome, failure) in result.failures() {
        writer.write_record([
            outcome.row.map(|r| r.to_string()).unwrap_or_default().as_str(),
            outcome.input.as_str(),
            outcome.name.as_deref().unwrap_or_default(),
            failure.kind.as_str(),
            failure.reason.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Asset cells in [`ASSET_COLUMNS`] order. Absent values are empty.
fn asset_fields(asset: &AssetRecord, name: Option<&str>) -> Vec<String> {
    fn opt<T: ToString>(value: Option<&T>) -> String {
        value.map(ToString::to_string).unwrap_or_default()
    }

    let details = &asset.details;
    vec![
        name.unwrap_or_default().to_string(),
        opt(details.id.as_ref()),
        asset.service_tag.to_string(),
        opt(details.order_buid.as_ref()),
        format_date(asset.ship_date),
        opt(details.product_code.as_ref()),
        opt(details.local_channel.as_ref()),
        opt(details.product_id.as_ref()),
        asset.product_line_description.clone(),
        opt(details.product_family.as_ref()),
        opt(details.system_description.as_ref()),
        opt(details.product_lob_description.as_ref()),
        asset.country_code.clone(),
        opt(details.duplicated.as_ref()),
        opt(details.invalid.as_ref()),
    ]
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
