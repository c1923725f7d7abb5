//! Service request model and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a service request.
///
/// Requests move only forward along
/// `Pending -> Scheduled -> InProgress -> Completed`, one step at a time;
/// `Cancelled` is reachable from any non-terminal state. `Completed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// Whether a request in this state holds one of the warranty's quota
    /// slots. Cancelled requests never consume quota, so a user may cancel
    /// and re-request.
    pub fn consumes_quota(&self) -> bool {
        !matches!(self, RequestStatus::Cancelled)
    }

    /// The closed transition table. Anything not listed — including no-op
    /// transitions like `Completed -> Completed` — is illegal, so callers
    /// holding a stale view get an error instead of silent success.
    pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (from, to),
            (Pending, Scheduled)
                | (Scheduled, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub warranty_id: Uuid,
    pub warranty_service_id: Uuid,
    pub user_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
}

/// Input for a customer-initiated service request. Status always starts
/// `Pending`; the quota check happens in the same storage transaction as
/// the insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub warranty_id: Uuid,
    pub warranty_service_id: Uuid,
    pub user_id: Uuid,
}
