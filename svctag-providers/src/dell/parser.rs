//! Dell asset-entitlements response parser.
//!
//! The response is a JSON array with one object per requested tag:
//!
//! ```json
//! [{
//!   "id": 123456789,
//!   "serviceTag": "ABC1234",
//!   "productLineDescription": "LATITUDE 5490",
//!   "shipDate": "2018-06-05T05:00:00Z",
//!   "countryCode": "US",
//!   "invalid": false,
//!   "entitlements": [{
//!     "itemNumber": "997-8328",
//!     "startDate": "2018-06-05T05:00:00Z",
//!     "endDate": "2021-06-05T04:59:59.999Z",
//!     "entitlementType": "INITIAL",
//!     "serviceLevelCode": "ND",
//!     "serviceLevelDescription": "Next Business Day Support",
//!     "serviceLevelGroup": 5
//!   }]
//! }]
//! ```
//!
//! Parsing is strict: required fields must be present with the expected
//! types. Fields not listed here are ignored.

use serde::Deserialize;
use serde_json::Value;
use svctag_core::{AssetEntitlements, AssetRecord, EntitlementError, EntitlementRecord, ServiceTag};
use tracing::{debug, warn};

/// One element of the response array.
#[derive(Debug, Deserialize)]
struct DellAsset {
    #[serde(flatten)]
    asset: AssetRecord,
    entitlements: Vec<EntitlementRecord>,
}

/// Parses a response body and extracts the entry for `tag`.
///
/// # Errors
///
/// - [`EntitlementError::NotFound`] if the array is empty, no element
///   matches `tag`, or the matching element is flagged `"invalid": true`.
/// - [`EntitlementError::Parse`] if the body is not a JSON array of objects,
///   the matching element does not have the required shape, or nothing
///   matches and some element has no `serviceTag`.
pub fn parse_entitlements_response(
    body: &str,
    tag: &ServiceTag,
) -> Result<AssetEntitlements, EntitlementError> {
    debug!(len = body.len(), tag = %tag, "Parsing entitlement response");

    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Entitlement response is not JSON");
        EntitlementError::Parse(format!("invalid JSON: {e}"))
    })?;

    let Value::Array(items) = value else {
        return Err(EntitlementError::Parse(format!(
            "expected a JSON array, got {}",
            type_name(&value)
        )));
    };

    let mut matched = None;
    let mut untagged = None;
    for (index, item) in items.into_iter().enumerate() {
        match item.get("serviceTag").and_then(Value::as_str) {
            Some(reported) if reported.trim().eq_ignore_ascii_case(tag.as_str()) => {}
            Some(reported) => {
                debug!(reported, "Skipping element for another tag");
                continue;
            }
            None => {
                untagged.get_or_insert(index);
                continue;
            }
        }
        matched = Some(item);
        break;
    }

    let Some(item) = matched else {
        // An untagged element might have been the requested one.
        if let Some(index) = untagged {
            return Err(EntitlementError::Parse(format!(
                "element {index} lacks a string serviceTag"
            )));
        }
        return Err(EntitlementError::NotFound(tag.to_string()));
    };

    if item.get("invalid").and_then(Value::as_bool) == Some(true) {
        debug!(tag = %tag, "Vendor flagged tag as invalid");
        return Err(EntitlementError::NotFound(tag.to_string()));
    }

    let parsed: DellAsset = serde_json::from_value(item).map_err(|e| {
        warn!(error = %e, tag = %tag, "Entitlement response has unexpected shape");
        EntitlementError::Parse(format!("unexpected response shape for {tag}: {e}"))
    })?;

    Ok(AssetEntitlements {
        asset: parsed.asset,
        entitlements: parsed.entitlements,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
