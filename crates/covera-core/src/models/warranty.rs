//! Warranty domain model and its derived lifecycle classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days before `warranty_end` at which coverage is flagged as expiring.
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

/// The one-time staff decision on a warranty. `Pending` is the initial
/// state; once `Approved` or `Rejected` the decision is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Administrative on/off flag, chosen at creation. Independent of the
/// approval decision and never derived from dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarrantyStatus {
    Active,
    Inactive,
}

/// A decision an approver can take. Deliberately excludes `Pending`, which
/// is a starting state and not something staff can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl ApprovalDecision {
    pub fn as_status(self) -> ApprovalStatus {
        match self {
            ApprovalDecision::Approved => ApprovalStatus::Approved,
            ApprovalDecision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// Derived display state combining the approval decision and the date
/// range. Never persisted; recomputed on every read so the passage of time
/// is reflected without a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveStatus {
    Rejected,
    Pending,
    Expired,
    Expiring,
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warranty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub warranty_type_id: Uuid,
    pub warranty_start: DateTime<Utc>,
    pub warranty_end: DateTime<Utc>,
    pub approval_status: ApprovalStatus,
    pub status: WarrantyStatus,
    /// When the approval decision was taken. Set for rejections too — it
    /// records who decided, not only who approved.
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warranty {
    /// Effective display state at `now`. Precedence, first match wins:
    /// rejected, pending, expired, expiring (ends within
    /// [`EXPIRING_WINDOW_DAYS`]), active.
    pub fn effective_status(&self, now: DateTime<Utc>) -> EffectiveStatus {
        match self.approval_status {
            ApprovalStatus::Rejected => EffectiveStatus::Rejected,
            ApprovalStatus::Pending => EffectiveStatus::Pending,
            ApprovalStatus::Approved => {
                if self.warranty_end < now {
                    EffectiveStatus::Expired
                } else if self.warranty_end < now + Duration::days(EXPIRING_WINDOW_DAYS) {
                    EffectiveStatus::Expiring
                } else {
                    EffectiveStatus::Active
                }
            }
        }
    }
}

/// Input for a customer-initiated warranty. Approval always starts
/// `Pending`; the administrative flag is chosen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWarranty {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub warranty_type_id: Uuid,
    pub warranty_start: DateTime<Utc>,
    pub warranty_end: DateTime<Utc>,
    pub status: WarrantyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warranty(approval: ApprovalStatus, start: DateTime<Utc>, end: DateTime<Utc>) -> Warranty {
        let now = Utc::now();
        Warranty {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            address_id: Uuid::new_v4(),
            warranty_type_id: Uuid::new_v4(),
            warranty_start: start,
            warranty_end: end,
            approval_status: approval,
            status: WarrantyStatus::Active,
            approved_at: None,
            approved_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rejection_outranks_dates() {
        let now = Utc::now();
        // Date range far in the future; rejection still wins.
        let w = warranty(
            ApprovalStatus::Rejected,
            now - Duration::days(1),
            now + Duration::days(365),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Rejected);
    }

    #[test]
    fn pending_outranks_dates() {
        let now = Utc::now();
        let w = warranty(
            ApprovalStatus::Pending,
            now - Duration::days(1),
            now + Duration::days(10),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Pending);
    }

    #[test]
    fn approved_past_end_is_expired() {
        let now = Utc::now();
        let w = warranty(
            ApprovalStatus::Approved,
            now - Duration::days(365),
            now - Duration::days(1),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Expired);
    }

    #[test]
    fn approved_ending_in_ten_days_is_expiring() {
        let now = Utc::now();
        let w = warranty(
            ApprovalStatus::Approved,
            now - Duration::days(355),
            now + Duration::days(10),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Expiring);
    }

    #[test]
    fn approved_with_long_runway_is_active() {
        let now = Utc::now();
        let w = warranty(
            ApprovalStatus::Approved,
            now - Duration::days(1),
            now + Duration::days(365),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Active);
    }

    #[test]
    fn expiring_window_boundary_is_exclusive() {
        let now = Utc::now();
        // Ending exactly at now + 30 days: not yet inside the window.
        let w = warranty(
            ApprovalStatus::Approved,
            now,
            now + Duration::days(EXPIRING_WINDOW_DAYS),
        );
        assert_eq!(w.effective_status(now), EffectiveStatus::Active);
    }

    #[test]
    fn ending_exactly_now_is_not_yet_expired() {
        let now = Utc::now();
        let w = warranty(ApprovalStatus::Approved, now - Duration::days(30), now);
        assert_eq!(w.effective_status(now), EffectiveStatus::Expiring);
    }
}
