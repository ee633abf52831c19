//! Shared fixtures for batch tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use svctag_core::{
    AssetDetails, AssetEntitlements, AssetRecord, EntitlementError, EntitlementLookup,
    EntitlementRecord, ServiceTag,
};
use tokio_util::sync::CancellationToken;

pub(crate) fn sample_payload(tag: &str, entitlements: usize) -> AssetEntitlements {
    let start = Utc.with_ymd_and_hms(2022, 1, 10, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    AssetEntitlements {
        asset: AssetRecord {
            service_tag: ServiceTag::parse(tag).unwrap(),
            product_line_description: "OPTIPLEX 7090".to_string(),
            ship_date: start,
            country_code: "DE".to_string(),
            details: AssetDetails::default(),
        },
        entitlements: (0..entitlements)
            .map(|i| EntitlementRecord {
                item_number: format!("{tag}-{i}"),
                start_date: start,
                end_date: end,
                entitlement_type: "INITIAL".to_string(),
                service_level_code: "ND".to_string(),
                service_level_description: "Next Business Day".to_string(),
                service_level_group: 5,
            })
            .collect(),
    }
}

/// Lookup double: fails configured tags, delays others, and counts calls.
#[derive(Default)]
pub(crate) struct MockLookup {
    failures: HashMap<String, EntitlementError>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    cancel_on: Option<(String, CancellationToken)>,
}

impl MockLookup {
    pub(crate) fn failing(mut self, tag: &str, err: EntitlementError) -> Self {
        self.failures.insert(tag.to_string(), err);
        self
    }

    pub(crate) fn delayed(mut self, tag: &str, delay: Duration) -> Self {
        self.delays.insert(tag.to_string(), delay);
        self
    }

    pub(crate) fn cancelling_on(mut self, tag: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((tag.to_string(), token));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitlementLookup for MockLookup {
    async fn lookup(&self, tag: &str) -> Result<Arc<AssetEntitlements>, EntitlementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.respond(tag).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockLookup {
    async fn respond(&self, tag: &str) -> Result<Arc<AssetEntitlements>, EntitlementError> {
        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == tag {
                token.cancel();
            }
        }
        if let Some(delay) = self.delays.get(tag) {
            tokio::time::sleep(*delay).await;
        }

        let parsed = ServiceTag::parse(tag)?;
        if let Some(err) = self.failures.get(tag) {
            return Err(err.clone());
        }
        Ok(Arc::new(sample_payload(parsed.as_str(), 1)))
    }
}
