//! Batch outcome types.
//!
//! A [`BatchResult`] is an ordered list of per-input outcomes. Counts are
//! always derived from that list and never stored separately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::asset::AssetEntitlements;
use crate::error::{EntitlementError, FailureKind};

// ============================================================================
// Tag Failure
// ============================================================================

/// Why a single input failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFailure {
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
}

impl TagFailure {
    /// Creates a failure.
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<&EntitlementError> for TagFailure {
    fn from(err: &EntitlementError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of looking up one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The lookup succeeded.
    Success(Arc<AssetEntitlements>),
    /// The lookup failed.
    Failure(TagFailure),
}

impl Outcome {
    /// Converts a lookup result into an outcome.
    pub fn from_result(result: Result<Arc<AssetEntitlements>, EntitlementError>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Failure(TagFailure::from(&e)),
        }
    }

    /// Returns true if the lookup succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// ============================================================================
// Inventory Fields
// ============================================================================

/// Asset-register columns copied verbatim from an input row to its export
/// rows. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFields {
    /// `Warranty` column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
    /// `Acquisition Date` column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition_date: Option<String>,
    /// `Warranty Expiry Date` column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_expiry_date: Option<String>,
}

impl InventoryFields {
    /// Returns true if no column had a value.
    pub fn is_empty(&self) -> bool {
        self.warranty.is_none()
            && self.acquisition_date.is_none()
            && self.warranty_expiry_date.is_none()
    }
}

// ============================================================================
// Tag Outcome
// ============================================================================

/// Outcome for one batch input, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagOutcome {
    /// Tag text as supplied (before normalization).
    pub input: String,
    /// 1-based source row when the input came from a CSV file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Asset name carried from the input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Inventory columns carried from the input.
    #[serde(default, skip_serializing_if = "InventoryFields::is_empty")]
    pub inventory: InventoryFields,
    /// What happened.
    pub outcome: Outcome,
}

impl TagOutcome {
    /// Creates an outcome for a bare tag.
    pub fn new(input: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            input: input.into(),
            row: None,
            name: None,
            inventory: InventoryFields::default(),
            outcome,
        }
    }

    /// Sets the source row.
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Sets the asset name.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the inventory columns.
    pub fn with_inventory(mut self, inventory: InventoryFields) -> Self {
        self.inventory = inventory;
        self
    }

    /// Returns the payload if the lookup succeeded.
    pub fn data(&self) -> Option<&AssetEntitlements> {
        match &self.outcome {
            Outcome::Success(data) => Some(data),
            Outcome::Failure(_) => None,
        }
    }

    /// Returns the failure if the lookup failed.
    pub fn failure(&self) -> Option<&TagFailure> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }
}

// ============================================================================
// Batch Result
// ============================================================================

/// Ordered outcomes of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    outcomes: Vec<TagOutcome>,
    cancelled: bool,
}

/// Derived counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Inputs that ran.
    pub processed: usize,
    /// Inputs that succeeded.
    pub successful: usize,
    /// Inputs that failed.
    pub failed: usize,
    /// Whether the run stopped early.
    pub cancelled: bool,
}

impl BatchResult {
    /// Creates a result from outcomes in input order.
    pub fn new(outcomes: Vec<TagOutcome>, cancelled: bool) -> Self {
        Self {
            outcomes,
            cancelled,
        }
    }

    /// All outcomes, in input order.
    pub fn outcomes(&self) -> &[TagOutcome] {
        &self.outcomes
    }

    /// Whether the batch was cancelled before every input ran.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of inputs that ran.
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of successful inputs.
    pub fn successful(&self) -> usize {
        self.successes().count()
    }

    /// Number of failed inputs.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Successful outcomes with their payloads, in input order.
    pub fn successes(&self) -> impl Iterator<Item = (&TagOutcome, &AssetEntitlements)> {
        self.outcomes.iter().filter_map(|o| o.data().map(|d| (o, d)))
    }

    /// Failed outcomes with their failures, in input order.
    pub fn failures(&self) -> impl Iterator<Item = (&TagOutcome, &TagFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.failure().map(|f| (o, f)))
    }

    /// Returns the derived counts.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            processed: self.processed(),
            successful: self.successful(),
            failed: self.failed(),
            cancelled: self.cancelled,
        }
    }
}

impl FromIterator<TagOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = TagOutcome>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect(), false)
    }
}
