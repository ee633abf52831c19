//! Serde tests for core types.
//!
//! The JSON shapes here are what the CLI and REST facade emit, so field
//! names and tagging are pinned explicitly.

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use crate::{
    AssetDetails, AssetEntitlements, AssetRecord, BatchResult, EntitlementError, EntitlementRecord,
    FailureKind, InventoryFields, Outcome, ServiceTag, TagFailure, TagOutcome,
};

fn sample() -> AssetEntitlements {
    AssetEntitlements {
        asset: AssetRecord {
            service_tag: ServiceTag::parse("ABC1234").unwrap(),
            product_line_description: "LATITUDE 5490".to_string(),
            ship_date: Utc.with_ymd_and_hms(2019, 1, 29, 6, 0, 0).unwrap(),
            country_code: "US".to_string(),
            details: AssetDetails {
                product_lob_description: Some("Latitude".to_string()),
                ..AssetDetails::default()
            },
        },
        entitlements: vec![EntitlementRecord {
            item_number: "997-8328".to_string(),
            start_date: Utc.with_ymd_and_hms(2019, 1, 29, 6, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2022, 1, 29, 5, 59, 59).unwrap(),
            entitlement_type: "INITIAL".to_string(),
            service_level_code: "ND".to_string(),
            service_level_description: "Next Business Day Onsite".to_string(),
            service_level_group: 5,
        }],
    }
}

// ============================================================================
// Record Tests
// ============================================================================

#[test]
fn test_asset_uses_camel_case() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["asset"]["serviceTag"], "ABC1234");
    assert_eq!(json["asset"]["productLineDescription"], "LATITUDE 5490");
    assert_eq!(json["asset"]["countryCode"], "US");
    assert_eq!(json["asset"]["productLobDescription"], "Latitude");
    assert!(json["asset"].get("systemDescription").is_none());
    assert!(json["asset"].get("details").is_none());
    assert_eq!(json["entitlements"][0]["serviceLevelGroup"], 5);
    assert_eq!(json["entitlements"][0]["itemNumber"], "997-8328");
}

#[test]
fn test_asset_entitlements_roundtrip() {
    let original = sample();
    let json = serde_json::to_string(&original).unwrap();
    let back: AssetEntitlements = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_coverage_helpers() {
    let data = sample();
    let inside = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    assert!(data.is_covered_at(inside));
    assert!(!data.is_covered_at(after));
    assert_eq!(data.coverage_end(), Some(data.entitlements[0].end_date));
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_outcome_tagging() {
    let ok = TagOutcome::new("abc1234", Outcome::Success(Arc::new(sample())));
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["outcome"]["status"], "success");
    assert_eq!(json["outcome"]["asset"]["serviceTag"], "ABC1234");
    assert!(json.get("inventory").is_none());

    let failed = TagOutcome::new(
        "bad tag",
        Outcome::Failure(TagFailure::new(FailureKind::Validation, "space")),
    )
    .with_row(3)
    .with_inventory(InventoryFields {
        warranty: Some("3Y ProSupport".to_string()),
        ..InventoryFields::default()
    });
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["outcome"]["status"], "failure");
    assert_eq!(json["outcome"]["kind"], "validation");
    assert_eq!(json["row"], 3);
    assert_eq!(json["inventory"]["warranty"], "3Y ProSupport");
    assert!(json["inventory"].get("acquisitionDate").is_none());
}

#[test]
fn test_derived_counts() {
    let result: BatchResult = vec![
        TagOutcome::new("A1", Outcome::Success(Arc::new(sample()))),
        TagOutcome::new(
            "A2",
            Outcome::from_result(Err(EntitlementError::NotFound("A2".into()))),
        ),
        TagOutcome::new("A3", Outcome::Success(Arc::new(sample()))),
    ]
    .into_iter()
    .collect();

    let summary = result.summary();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.cancelled);
    assert_eq!(
        summary.successful + summary.failed,
        summary.processed,
        "partitions must cover every outcome"
    );

    let (failed, failure) = result.failures().next().unwrap();
    assert_eq!(failed.input, "A2");
    assert_eq!(failure.kind, FailureKind::NotFound);
}
