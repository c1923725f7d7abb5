//! Service request workflow: quota-bounded creation and lifecycle
//! transitions.

use chrono::{DateTime, Utc};
use covera_core::error::{CoveraError, CoveraResult};
use covera_core::models::service_request::{CreateServiceRequest, RequestStatus, ServiceRequest};
use covera_core::repository::ServiceRequestRepository;
use tracing::info;
use uuid::Uuid;

pub struct RequestService<R: ServiceRequestRepository> {
    requests: R,
}

impl<R: ServiceRequestRepository> RequestService<R> {
    pub fn new(requests: R) -> Self {
        Self { requests }
    }

    /// Create a request for `warranty_id` / `warranty_service_id`.
    ///
    /// The entitlement lookup, the quota count, and the insert are one
    /// storage transaction — an advisory `can_request` beforehand is a UX
    /// nicety, not the enforcement point.
    pub async fn create(&self, input: CreateServiceRequest) -> CoveraResult<ServiceRequest> {
        let request = self.requests.create_within_quota(input).await?;

        info!(
            request_id = %request.id,
            warranty_id = %request.warranty_id,
            warranty_service_id = %request.warranty_service_id,
            "service request created"
        );

        Ok(request)
    }

    /// Move a request to `to`, enforcing the transition table. Illegal
    /// moves — including no-ops against terminal states — come back as
    /// `InvalidTransition` so callers holding a stale view find out.
    pub async fn transition(
        &self,
        request_id: Uuid,
        to: RequestStatus,
    ) -> CoveraResult<ServiceRequest> {
        self.apply(request_id, to, None).await
    }

    /// Transition to `Scheduled`, recording the appointment date.
    pub async fn schedule(
        &self,
        request_id: Uuid,
        when: DateTime<Utc>,
    ) -> CoveraResult<ServiceRequest> {
        self.apply(request_id, RequestStatus::Scheduled, Some(when))
            .await
    }

    /// Cancel a request, freeing its quota slot.
    pub async fn cancel(&self, request_id: Uuid) -> CoveraResult<ServiceRequest> {
        self.apply(request_id, RequestStatus::Cancelled, None).await
    }

    async fn apply(
        &self,
        request_id: Uuid,
        to: RequestStatus,
        scheduled_date: Option<DateTime<Utc>>,
    ) -> CoveraResult<ServiceRequest> {
        // 1. Validate against the status we can currently observe.
        let current = self.requests.get(request_id).await?;
        let from = current.status;
        if !RequestStatus::can_transition(from, to) {
            return Err(CoveraError::InvalidTransition { from, to });
        }

        // 2. Compare-and-swap conditioned on that status. A lost swap
        //    means the row moved under us; report against the fresh
        //    status instead of retrying.
        match self
            .requests
            .transition(request_id, from, to, scheduled_date)
            .await?
        {
            Some(updated) => {
                info!(
                    request_id = %request_id,
                    from = ?from,
                    to = ?to,
                    "service request transitioned"
                );
                Ok(updated)
            }
            None => {
                let fresh = self.requests.get(request_id).await?;
                Err(CoveraError::InvalidTransition {
                    from: fresh.status,
                    to,
                })
            }
        }
    }

    pub async fn get(&self, request_id: Uuid) -> CoveraResult<ServiceRequest> {
        self.requests.get(request_id).await
    }

    /// Requests filed against one warranty, newest first.
    pub async fn for_warranty(&self, warranty_id: Uuid) -> CoveraResult<Vec<ServiceRequest>> {
        self.requests.list_for_warranty(warranty_id).await
    }

    /// Requests filed by one user, newest first.
    pub async fn for_user(&self, user_id: Uuid) -> CoveraResult<Vec<ServiceRequest>> {
        self.requests.list_for_user(user_id).await
    }
}
