use std::sync::Arc;
use std::time::Duration;
use svctag_core::{EntitlementError, FailureKind};
use tokio_util::sync::CancellationToken;

use crate::import::{ImportOptions, import_tags};
use crate::processor::BatchProcessor;
use crate::test_support::MockLookup;

#[tokio::test]
async fn test_partial_failure_keeps_order_and_counts() {
    let mock = MockLookup::default().failing("T2", EntitlementError::NotFound("T2".into()));
    let processor = BatchProcessor::new(Arc::new(mock));

    let result = processor.process(["T1", "T2", "T3"]).await;

    assert_eq!(result.processed(), 3);
    assert_eq!(result.successful(), 2);
    assert_eq!(result.failed(), 1);
    assert!(!result.was_cancelled());

    let inputs: Vec<_> = result.outcomes().iter().map(|o| o.input.as_str()).collect();
    assert_eq!(inputs, ["T1", "T2", "T3"]);
    assert_eq!(
        result.outcomes()[1].failure().unwrap().kind,
        FailureKind::NotFound
    );
}

#[tokio::test]
async fn test_order_independent_of_completion() {
    let mock = MockLookup::default()
        .delayed("SLOW1", Duration::from_millis(80))
        .delayed("SLOW2", Duration::from_millis(40));
    let processor = BatchProcessor::new(Arc::new(mock)).with_concurrency(3);

    let result = processor.process(["SLOW1", "SLOW2", "FAST3"]).await;

    let tags: Vec<_> = result
        .successes()
        .map(|(_, d)| d.asset.service_tag.as_str().to_string())
        .collect();
    assert_eq!(tags, ["SLOW1", "SLOW2", "FAST3"]);
}

#[tokio::test]
async fn test_duplicates_processed_independently() {
    let mock = Arc::new(MockLookup::default());
    let processor = BatchProcessor::new(mock.clone());

    let result = processor.process(["AAA", "AAA", "aaa"]).await;

    assert_eq!(result.successful(), 3);
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn test_all_failures_still_complete() {
    let processor = BatchProcessor::new(Arc::new(MockLookup::default()));
    let result = processor.process(["bad tag", "", "also-bad"]).await;

    assert_eq!(result.processed(), 3);
    assert_eq!(result.failed(), 3);
    assert!(
        result
            .failures()
            .all(|(_, f)| f.kind == FailureKind::Validation)
    );
}

#[tokio::test]
async fn test_empty_batch() {
    let processor = BatchProcessor::new(Arc::new(MockLookup::default()));
    let result = processor.process(Vec::<String>::new()).await;
    assert_eq!(result.processed(), 0);
    assert!(!result.was_cancelled());
}

#[tokio::test]
async fn test_cancel_skips_unstarted_tags() {
    let token = CancellationToken::new();
    let mock = Arc::new(MockLookup::default().cancelling_on("T2", token.clone()));
    let processor = BatchProcessor::new(mock.clone()).with_concurrency(1);

    let result = processor
        .process_with_cancel(["T1", "T2", "T3", "T4"], &token)
        .await;

    // T2 was in flight when the token fired and runs to completion.
    assert!(result.was_cancelled());
    assert_eq!(result.processed(), 2);
    assert_eq!(mock.calls(), 2);
    let inputs: Vec<_> = result.outcomes().iter().map(|o| o.input.as_str()).collect();
    assert_eq!(inputs, ["T1", "T2"]);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let mock = Arc::new(MockLookup::default());
    let processor = BatchProcessor::new(mock.clone());

    let result = processor.process_with_cancel(["T1", "T2"], &token).await;

    assert!(result.was_cancelled());
    assert_eq!(result.processed(), 0);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let tags: Vec<String> = (0..12).map(|i| format!("TAG{i}")).collect();
    let mut mock = MockLookup::default();
    for tag in &tags {
        mock = mock.delayed(tag, Duration::from_millis(20));
    }
    let mock = Arc::new(mock);
    let processor = BatchProcessor::new(mock.clone()).with_concurrency(3);

    let result = processor.process(tags).await;

    assert_eq!(result.successful(), 12);
    assert!(mock.max_in_flight() <= 3);
    assert!(mock.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_concurrency_floor() {
    let processor = BatchProcessor::new(Arc::new(MockLookup::default())).with_concurrency(0);
    assert_eq!(processor.concurrency(), 1);
}

#[tokio::test]
async fn test_import_rows_and_skips_in_position() {
    let csv = "Name,Asset Tag\nDesk,ABC1234\nNoTag,\nLaptop,DEF5678\n";
    let import = import_tags(csv.as_bytes(), &ImportOptions::default()).unwrap();
    let processor = BatchProcessor::new(Arc::new(MockLookup::default()));

    let result = processor.process_import(&import).await;

    assert_eq!(result.processed(), 3);
    assert_eq!(result.successful(), 2);
    let rows: Vec<_> = result.outcomes().iter().map(|o| o.row).collect();
    assert_eq!(rows, [Some(2), Some(3), Some(4)]);
    assert_eq!(result.outcomes()[0].name.as_deref(), Some("Desk"));
    assert_eq!(
        result.outcomes()[1].failure().unwrap().kind,
        FailureKind::Validation
    );
}

#[tokio::test]
async fn test_inventory_columns_reach_outcomes() {
    let csv = "Asset Tag,Warranty,Acquisition Date\nABC1234,Basic,2021-04-01\nbad tag,Basic,\n";
    let import = import_tags(csv.as_bytes(), &ImportOptions::default()).unwrap();
    let processor = BatchProcessor::new(Arc::new(MockLookup::default()));

    let result = processor.process_import(&import).await;

    let found = &result.outcomes()[0].inventory;
    assert_eq!(found.warranty.as_deref(), Some("Basic"));
    assert_eq!(found.acquisition_date.as_deref(), Some("2021-04-01"));
    assert_eq!(found.warranty_expiry_date, None);
    assert_eq!(
        result.outcomes()[1].inventory.warranty.as_deref(),
        Some("Basic")
    );
}
