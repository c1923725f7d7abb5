//! Entitlement ledger: remaining-quota reads for a (warranty, service)
//! pair.
//!
//! These are advisory reads for request forms and detail pages. The
//! creation path never trusts them — it re-checks the quota inside the
//! same storage transaction that inserts the request row.

use covera_core::error::CoveraResult;
use covera_core::repository::{CatalogRepository, ServiceRequestRepository, WarrantyRepository};
use uuid::Uuid;

pub struct EntitlementLedger<W, C, R> {
    warranties: W,
    catalog: C,
    requests: R,
}

impl<W, C, R> EntitlementLedger<W, C, R>
where
    W: WarrantyRepository,
    C: CatalogRepository,
    R: ServiceRequestRepository,
{
    pub fn new(warranties: W, catalog: C, requests: R) -> Self {
        Self {
            warranties,
            catalog,
            requests,
        }
    }

    /// Quota slots still open for the pair: the rule's ceiling minus the
    /// count of non-cancelled requests, floored at zero. A pair without a
    /// rule has no entitlement and reports zero.
    pub async fn remaining_uses(
        &self,
        warranty_id: Uuid,
        warranty_service_id: Uuid,
    ) -> CoveraResult<u32> {
        let warranty = self.warranties.get(warranty_id).await?;
        let Some(rule) = self
            .catalog
            .rule_for(warranty.warranty_type_id, warranty_service_id)
            .await?
        else {
            return Ok(0);
        };

        let used = self
            .requests
            .count_active(warranty_id, warranty_service_id)
            .await?;

        Ok(rule.max_uses.saturating_sub(used))
    }

    /// Whether one more request would fit under the pair's ceiling.
    /// `false` for a pair without a rule — no entitlement is a normal
    /// answer, not an error.
    pub async fn can_request(
        &self,
        warranty_id: Uuid,
        warranty_service_id: Uuid,
    ) -> CoveraResult<bool> {
        let warranty = self.warranties.get(warranty_id).await?;
        let Some(rule) = self
            .catalog
            .rule_for(warranty.warranty_type_id, warranty_service_id)
            .await?
        else {
            return Ok(false);
        };

        let used = self
            .requests
            .count_active(warranty_id, warranty_service_id)
            .await?;

        Ok(used < rule.max_uses)
    }
}
