//! Repository trait definitions for data access abstraction.
//!
//! All operations are async. The methods documented as **atomic** are the
//! check-then-act seams of the system: implementations must perform the
//! check and the write as a single storage transaction, because independent
//! caller sessions race on the same rows. A plain query-then-write sequence
//! is not an acceptable implementation of those methods.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoveraResult;
use crate::models::{
    catalog::{
        CreateWarrantyService, CreateWarrantyType, DefineRule, EntitlementRule, WarrantyService,
        WarrantyType,
    },
    role::{NewRoleChange, Role, RoleChangeRecord},
    service_request::{CreateServiceRequest, RequestStatus, ServiceRequest},
    warranty::{ApprovalDecision, CreateWarranty, Warranty},
};

/// Role storage plus its append-only change history.
pub trait RoleDirectory: Send + Sync {
    /// Current role for a user. Accounts without an explicit assignment
    /// read as [`Role::Customer`].
    fn role_of(&self, user_id: Uuid) -> impl Future<Output = CoveraResult<Role>> + Send;

    /// **Atomic**: applies the new role and appends the change record as
    /// one unit — both commit or neither does. The old role is captured
    /// inside the same transaction.
    fn assign_role_recorded(
        &self,
        change: NewRoleChange,
    ) -> impl Future<Output = CoveraResult<RoleChangeRecord>> + Send;

    /// Change history for one user, newest first.
    fn changes_for(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Vec<RoleChangeRecord>>> + Send;

    /// Most recent changes across all users, newest first.
    fn recent_changes(
        &self,
        limit: u64,
    ) -> impl Future<Output = CoveraResult<Vec<RoleChangeRecord>>> + Send;
}

pub trait WarrantyRepository: Send + Sync {
    fn create(&self, input: CreateWarranty) -> impl Future<Output = CoveraResult<Warranty>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = CoveraResult<Warranty>> + Send;

    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Vec<Warranty>>> + Send;

    /// Warranties still awaiting an approval decision, oldest first.
    fn list_pending(&self) -> impl Future<Output = CoveraResult<Vec<Warranty>>> + Send;

    /// **Atomic**: writes the decision only if the warranty is still
    /// pending, stamping `approved_at` and `approved_by_id`. A warranty
    /// that already carries a decision yields
    /// [`CoveraError::AlreadyDecided`](crate::error::CoveraError); under
    /// two concurrent decisions exactly one commits.
    fn decide_if_pending(
        &self,
        warranty_id: Uuid,
        approver_id: Uuid,
        decision: ApprovalDecision,
    ) -> impl Future<Output = CoveraResult<Warranty>> + Send;
}

/// Warranty types, claimable services, and the entitlement rules joining
/// them.
pub trait CatalogRepository: Send + Sync {
    fn create_type(
        &self,
        input: CreateWarrantyType,
    ) -> impl Future<Output = CoveraResult<WarrantyType>> + Send;

    fn get_type(&self, id: Uuid) -> impl Future<Output = CoveraResult<WarrantyType>> + Send;

    fn list_types(&self) -> impl Future<Output = CoveraResult<Vec<WarrantyType>>> + Send;

    fn create_service(
        &self,
        input: CreateWarrantyService,
    ) -> impl Future<Output = CoveraResult<WarrantyService>> + Send;

    fn get_service(&self, id: Uuid) -> impl Future<Output = CoveraResult<WarrantyService>> + Send;

    fn list_services(&self) -> impl Future<Output = CoveraResult<Vec<WarrantyService>>> + Send;

    /// Upsert: at most one rule exists per (type, service) pair.
    fn define_rule(
        &self,
        input: DefineRule,
    ) -> impl Future<Output = CoveraResult<EntitlementRule>> + Send;

    /// `None` when the pair has no rule — absence of entitlement is a
    /// normal answer, not an error.
    fn rule_for(
        &self,
        warranty_type_id: Uuid,
        warranty_service_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Option<EntitlementRule>>> + Send;

    fn rules_for_type(
        &self,
        warranty_type_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Vec<EntitlementRule>>> + Send;
}

pub trait ServiceRequestRepository: Send + Sync {
    /// **Atomic**: resolves the warranty's entitlement rule, counts the
    /// pair's non-cancelled requests, and inserts the new row in one
    /// transaction. Rejects with `NotEntitled` when no rule exists and
    /// `QuotaExceeded` when the count has reached the rule's ceiling; the
    /// count can never be observed above the ceiling.
    fn create_within_quota(
        &self,
        input: CreateServiceRequest,
    ) -> impl Future<Output = CoveraResult<ServiceRequest>> + Send;

    fn get(&self, id: Uuid) -> impl Future<Output = CoveraResult<ServiceRequest>> + Send;

    fn list_for_warranty(
        &self,
        warranty_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Vec<ServiceRequest>>> + Send;

    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CoveraResult<Vec<ServiceRequest>>> + Send;

    /// Count of requests currently consuming a quota slot for the pair
    /// (every status except cancelled).
    fn count_active(
        &self,
        warranty_id: Uuid,
        warranty_service_id: Uuid,
    ) -> impl Future<Output = CoveraResult<u32>> + Send;

    /// Compare-and-swap status update: applies only if the stored status
    /// still equals `from`. `None` means the row moved under the caller (or
    /// does not exist) and nothing was written. Transitions to `Completed`
    /// stamp `completed_date`; `scheduled_date`, when given, is stored
    /// alongside the new status.
    fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        scheduled_date: Option<DateTime<Utc>>,
    ) -> impl Future<Output = CoveraResult<Option<ServiceRequest>>> + Send;
}
