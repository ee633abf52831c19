//! CSV import of service tags.
//!
//! The input must have a header row. The tag column is chosen as follows:
//!
//! 1. the column named by [`ImportOptions::column`] (case-insensitive);
//!    missing is a whole-file error;
//! 2. otherwise the first header matching a known alias
//!    (`Asset Tag`, `asset_tag`, `assettag`, `Service Tag`, ...);
//! 3. otherwise the first column.
//!
//! A `Name` column, if present, is carried along as a label, and the
//! `Warranty`, `Acquisition Date` and `Warranty Expiry Date` columns as
//! [`InventoryFields`]. Rows with an empty tag cell or that cannot be decoded
//! become [`SkippedRow`]s.

use csv::ByteRecord;
use std::io::Read;
use std::path::Path;
use svctag_core::{InventoryFields, UTF8_BOM};
use tracing::{debug, warn};

use crate::error::ImportError;

/// Header names recognized as the tag column, compared case-insensitively.
pub const TAG_COLUMN_ALIASES: &[&str] = &[
    "asset tag",
    "asset_tag",
    "assettag",
    "service tag",
    "service_tag",
    "servicetag",
];

/// Header name of the optional label column.
pub const NAME_COLUMN: &str = "name";

/// Header names of the `Warranty` pass-through column.
pub const WARRANTY_ALIASES: &[&str] = &["warranty"];

/// Header names of the `Acquisition Date` pass-through column.
pub const ACQUISITION_DATE_ALIASES: &[&str] = &["acquisition date", "acquisition_date"];

/// Header names of the `Warranty Expiry Date` pass-through column.
pub const WARRANTY_EXPIRY_ALIASES: &[&str] = &["warranty expiry date", "warranty_expiry_date"];

// ============================================================================
// Types
// ============================================================================

/// Options for [`import_tags`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Tag column name. `None` auto-detects.
    pub column: Option<String>,
    /// Field delimiter. `None` detects `,` or tab from the header line.
    pub delimiter: Option<u8>,
}

impl ImportOptions {
    /// Sets the tag column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets the delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// A row that yielded a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Line number in the source file (the header is line 1).
    pub row: usize,
    /// Tag text, trimmed but not validated.
    pub tag: String,
    /// Value of the `Name` column, if present and non-empty.
    pub name: Option<String>,
    /// Inventory columns of the row.
    pub inventory: InventoryFields,
}

/// A row that did not yield a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Line number in the source file.
    pub row: usize,
    /// Raw row content, fields rejoined with the delimiter.
    pub raw: String,
    /// Why the row was skipped.
    pub reason: String,
}

/// One entry of an import, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEntry {
    /// A usable row.
    Tag(TagRecord),
    /// A skipped row.
    Skipped(SkippedRow),
}

impl ImportEntry {
    /// Returns the source line number.
    pub fn row(&self) -> usize {
        match self {
            Self::Tag(r) => r.row,
            Self::Skipped(s) => s.row,
        }
    }
}

/// Result of importing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagImport {
    /// Header of the tag column that was used.
    pub column: String,
    /// Delimiter that was used.
    pub delimiter: u8,
    /// Every data row, in file order.
    pub entries: Vec<ImportEntry>,
}

impl TagImport {
    /// Returns the usable rows.
    pub fn records(&self) -> impl Iterator<Item = &TagRecord> {
        self.entries.iter().filter_map(|e| match e {
            ImportEntry::Tag(r) => Some(r),
            ImportEntry::Skipped(_) => None,
        })
    }

    /// Returns the skipped rows.
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedRow> {
        self.entries.iter().filter_map(|e| match e {
            ImportEntry::Skipped(s) => Some(s),
            ImportEntry::Tag(_) => None,
        })
    }

    /// Returns the number of data rows, skipped ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Import
// ============================================================================

/// Imports tags from a file.
pub fn import_tags_from_path(
    path: &Path,
    options: &ImportOptions,
) -> Result<TagImport, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let import = import_tags(file, options).map_err(|e| match e {
        ImportError::Io { source, .. } => ImportError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    debug!(
        path = %path.display(),
        rows = import.len(),
        column = %import.column,
        "Imported tags"
    );
    Ok(import)
}

/// Imports tags from CSV content.
///
/// # Errors
///
/// Fails if the input cannot be read, has no header, or lacks the requested
/// column. Problems with individual rows never fail the import.
pub fn import_tags<R: Read>(mut reader: R, options: &ImportOptions) -> Result<TagImport, ImportError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| ImportError::Io {
            path: "<input>".into(),
            source,
        })?;
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(content));

    let mut csv = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ImportError::Empty);
    }

    let tag_index = resolve_tag_column(&headers, options.column.as_deref())?;
    let columns = ExtraColumns {
        name: find_column(&headers, &[NAME_COLUMN], tag_index),
        warranty: find_column(&headers, WARRANTY_ALIASES, tag_index),
        acquisition_date: find_column(&headers, ACQUISITION_DATE_ALIASES, tag_index),
        warranty_expiry_date: find_column(&headers, WARRANTY_EXPIRY_ALIASES, tag_index),
    };
    debug!(
        column = %headers[tag_index],
        delimiter = %char::from(delimiter).escape_default(),
        "Resolved tag column"
    );

    let separator = char::from(delimiter).to_string();
    let mut entries = Vec::new();
    for (offset, result) in csv.byte_records().enumerate() {
        // Header is line 1; fall back to counting when position is unknown.
        let fallback_row = offset + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let row = e
                    .position()
                    .and_then(|p| usize::try_from(p.line()).ok())
                    .unwrap_or(fallback_row);
                warn!(row, error = %e, "Skipping unreadable row");
                entries.push(ImportEntry::Skipped(SkippedRow {
                    row,
                    raw: String::new(),
                    reason: format!("unreadable row: {e}"),
                }));
                continue;
            }
        };
        let row = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(fallback_row);

        let raw = record
            .iter()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(separator.as_str());

        let tag = match record.get(tag_index).map(std::str::from_utf8) {
            None => {
                entries.push(ImportEntry::Skipped(SkippedRow {
                    row,
                    raw,
                    reason: format!("row has no '{}' field", headers[tag_index]),
                }));
                continue;
            }
            Some(Err(_)) => {
                entries.push(ImportEntry::Skipped(SkippedRow {
                    row,
                    raw,
                    reason: "service tag is not valid UTF-8".to_string(),
                }));
                continue;
            }
            Some(Ok(tag)) if tag.trim().is_empty() => {
                entries.push(ImportEntry::Skipped(SkippedRow {
                    row,
                    raw,
                    reason: "empty service tag".to_string(),
                }));
                continue;
            }
            Some(Ok(tag)) => tag.trim().to_string(),
        };

        entries.push(ImportEntry::Tag(TagRecord {
            row,
            tag,
            name: cell(&record, columns.name),
            inventory: InventoryFields {
                warranty: cell(&record, columns.warranty),
                acquisition_date: cell(&record, columns.acquisition_date),
                warranty_expiry_date: cell(&record, columns.warranty_expiry_date),
            },
        }));
    }

    Ok(TagImport {
        column: headers[tag_index].clone(),
        delimiter,
        entries,
    })
}

/// Positions of the optional columns carried alongside the tag.
struct ExtraColumns {
    name: Option<usize>,
    warranty: Option<usize>,
    acquisition_date: Option<usize>,
    warranty_expiry_date: Option<usize>,
}

fn find_column(headers: &[String], aliases: &[&str], tag_index: usize) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|alias| h.eq_ignore_ascii_case(alias)))
        .filter(|&i| i != tag_index)
}

/// Returns the trimmed cell at `index`; empty and missing cells are `None`.
fn cell(record: &ByteRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(|v| String::from_utf8_lossy(v).trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Picks `,` or tab from the first line; `,` wins ties and is the default.
fn detect_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|&b| b == b'\n').next().unwrap_or_default();
    if first_line.contains(&b',') {
        b','
    } else if first_line.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

fn resolve_tag_column(headers: &[String], requested: Option<&str>) -> Result<usize, ImportError> {
    if let Some(wanted) = requested {
        let wanted = wanted.trim();
        return headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ImportError::MissingColumn {
                column: wanted.to_string(),
                available: headers.to_vec(),
            });
    }

    Ok(headers
        .iter()
        .position(|h| {
            TAG_COLUMN_ALIASES
                .iter()
                .any(|alias| h.eq_ignore_ascii_case(alias))
        })
        .unwrap_or(0))
}
