//! Error types for the Covera system.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::service_request::RequestStatus;

/// Why a role mutation was refused.
///
/// Carried inside [`CoveraError::PermissionDenied`] so the caller can render
/// a specific message ("cannot modify your own role" vs. "cannot modify
/// another admin") instead of a generic denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// Actors may never modify their own role, regardless of privilege.
    SelfChange,
    /// The target account or the requested role is dev/admin and the actor
    /// is not a dev.
    ProtectedTarget,
    /// The actor holds no role that may mutate roles at all.
    InsufficientRole,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::SelfChange => write!(f, "cannot modify your own role"),
            DenyReason::ProtectedTarget => {
                write!(f, "cannot modify a dev or admin account")
            }
            DenyReason::InsufficientRole => {
                write!(f, "role does not permit role administration")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CoveraError {
    #[error("permission denied: {reason}")]
    PermissionDenied { reason: DenyReason },

    #[error("service quota exhausted for warranty {warranty_id}, service {warranty_service_id}")]
    QuotaExceeded {
        warranty_id: Uuid,
        warranty_service_id: Uuid,
    },

    #[error("warranty type {warranty_type_id} carries no entitlement for service {warranty_service_id}")]
    NotEntitled {
        warranty_type_id: Uuid,
        warranty_service_id: Uuid,
    },

    #[error("invalid request transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("warranty {warranty_id} already has an approval decision")]
    AlreadyDecided { warranty_id: Uuid },

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl CoveraError {
    /// Only storage failures are worth retrying. Every other variant is a
    /// deterministic business-rule rejection and will fail the same way
    /// again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoveraError::Storage(_))
    }
}

pub type CoveraResult<T> = Result<T, CoveraError>;
