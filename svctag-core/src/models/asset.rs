//! Asset and entitlement records.
//!
//! These are the parsed, vendor-neutral shapes of a lookup response:
//! - [`AssetRecord`] - What the asset is and where it shipped
//! - [`AssetDetails`] - Optional vendor attributes of an asset
//! - [`EntitlementRecord`] - One warranty/service-coverage line
//! - [`AssetEntitlements`] - An asset with its ordered entitlements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tag::ServiceTag;

// ============================================================================
// Asset Record
// ============================================================================

/// Descriptive information about a physical asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Service tag the asset is registered under.
    pub service_tag: ServiceTag,
    /// Product line, e.g. "Latitude 5490".
    pub product_line_description: String,
    /// Date the asset shipped.
    pub ship_date: DateTime<Utc>,
    /// ISO country code of the shipping destination.
    pub country_code: String,
    /// Fields the vendor may omit.
    #[serde(flatten)]
    pub details: AssetDetails,
}

/// Optional asset attributes. Absent or `null` values parse as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetails {
    /// Vendor record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Business unit the order was placed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_buid: Option<u64>,
    /// Product code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    /// Sales channel code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_channel: Option<String>,
    /// Vendor product slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Product family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_family: Option<String>,
    /// System description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_description: Option<String>,
    /// Line-of-business description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_lob_description: Option<String>,
    /// Whether the vendor reports more than one asset under this tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicated: Option<bool>,
    /// Vendor flag for unrecognized tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid: Option<bool>,
}

// ============================================================================
// Entitlement Record
// ============================================================================

/// A single warranty or service-coverage line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    /// Vendor SKU for the coverage.
    pub item_number: String,
    /// Coverage start.
    pub start_date: DateTime<Utc>,
    /// Coverage end.
    pub end_date: DateTime<Utc>,
    /// Entitlement type, e.g. "INITIAL" or "EXTENDED".
    pub entitlement_type: String,
    /// Service level code, e.g. "ND".
    pub service_level_code: String,
    /// Service level description.
    pub service_level_description: String,
    /// Service level group.
    pub service_level_group: u32,
}

impl EntitlementRecord {
    /// Returns true if the coverage window contains `at`.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

// ============================================================================
// Asset Entitlements
// ============================================================================

/// The full lookup payload for one service tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntitlements {
    /// The asset.
    pub asset: AssetRecord,
    /// Entitlements in the order the vendor returned them.
    pub entitlements: Vec<EntitlementRecord>,
}

impl AssetEntitlements {
    /// Returns the latest end date across all entitlements.
    pub fn coverage_end(&self) -> Option<DateTime<Utc>> {
        self.entitlements.iter().map(|e| e.end_date).max()
    }

    /// Returns true if any entitlement covers `at`.
    pub fn is_covered_at(&self, at: DateTime<Utc>) -> bool {
        self.entitlements.iter().any(|e| e.is_active_at(at))
    }
}
