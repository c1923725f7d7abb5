//! Warranty catalog: types, claimable services, and entitlement rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A warranty product offered to customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantyType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWarrantyType {
    pub name: String,
    pub description: String,
}

/// A service that can be claimed under some warranty type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantyService {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWarrantyService {
    pub name: String,
    pub description: String,
}

/// Entitlement rule: the ceiling of non-cancelled service requests allowed
/// for a service under a warranty type. Keyed by the (type, service) pair;
/// a pair without a rule grants no entitlement at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementRule {
    pub warranty_type_id: Uuid,
    pub warranty_service_id: Uuid,
    pub max_uses: u32,
}

/// Input for defining (or redefining) the rule for a (type, service) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineRule {
    pub warranty_type_id: Uuid,
    pub warranty_service_id: Uuid,
    pub max_uses: u32,
}
