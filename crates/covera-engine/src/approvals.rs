//! Warranty approval workflow.

use covera_core::error::CoveraResult;
use covera_core::models::warranty::{ApprovalDecision, Warranty};
use covera_core::repository::WarrantyRepository;
use tracing::info;
use uuid::Uuid;

pub struct ApprovalService<W: WarrantyRepository> {
    warranties: W,
}

impl<W: WarrantyRepository> ApprovalService<W> {
    pub fn new(warranties: W) -> Self {
        Self { warranties }
    }

    /// Record the one-time approval decision for a warranty.
    ///
    /// Rejected outright with `AlreadyDecided` when the warranty is no
    /// longer pending — a disabled button in some UI is a hint, not the
    /// enforcement point. The pending check and the write are one storage
    /// transaction, so of two concurrent decisions exactly one commits.
    /// `approved_at` / `approved_by_id` are stamped for rejections too:
    /// they record who decided, not only who approved.
    pub async fn decide(
        &self,
        warranty_id: Uuid,
        approver_id: Uuid,
        decision: ApprovalDecision,
    ) -> CoveraResult<Warranty> {
        let warranty = self
            .warranties
            .decide_if_pending(warranty_id, approver_id, decision)
            .await?;

        info!(
            warranty_id = %warranty_id,
            approver_id = %approver_id,
            decision = ?decision,
            "warranty decision recorded"
        );

        Ok(warranty)
    }

    /// Warranties still awaiting a decision, oldest first.
    pub async fn pending_queue(&self) -> CoveraResult<Vec<Warranty>> {
        self.warranties.list_pending().await
    }
}
