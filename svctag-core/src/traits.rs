//! Trait definitions for svctag.
//!
//! [`EntitlementLookup`] is the seam between vendor clients and the layers
//! that drive them (batch processing, the REST facade, the CLI).

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::EntitlementError;
use crate::models::{AssetEntitlements, AssetRecord, EntitlementRecord};

/// Something that can resolve a service tag to its asset and entitlements.
///
/// Implementors validate the raw tag before doing any I/O and report
/// malformed input as [`EntitlementError::Validation`].
#[async_trait]
pub trait EntitlementLookup: Send + Sync {
    /// Looks up the asset and its entitlements.
    async fn lookup(&self, tag: &str) -> Result<Arc<AssetEntitlements>, EntitlementError>;

    /// Looks up only the asset record.
    async fn lookup_asset(&self, tag: &str) -> Result<AssetRecord, EntitlementError> {
        Ok(self.lookup(tag).await?.asset.clone())
    }

    /// Looks up only the entitlements, in vendor order.
    async fn lookup_entitlement(
        &self,
        tag: &str,
    ) -> Result<Vec<EntitlementRecord>, EntitlementError> {
        Ok(self.lookup(tag).await?.entitlements.clone())
    }
}
