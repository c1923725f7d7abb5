//! Staff role model and the role-change audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff role governing mutation rights over other accounts.
///
/// Every person maps to exactly one role at a time; accounts without an
/// explicit assignment read as [`Role::Customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    Dev,
    Admin,
    User,
    #[default]
    Customer,
}

impl Role {
    /// Dev and admin accounts may only be touched by devs.
    pub fn is_protected(&self) -> bool {
        matches!(self, Role::Dev | Role::Admin)
    }
}

/// The authenticated caller of an engine operation.
///
/// Always passed explicitly; the engine never reads ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

/// One applied role mutation. Immutable and append-only: exactly one record
/// exists per successful role change, written in the same storage
/// transaction as the role itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChangeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub old_role: Role,
    pub new_role: Role,
    pub changed_by_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Input for an audited role mutation. The old role is not supplied here;
/// it is captured inside the assignment transaction so the audit record
/// stays consistent under concurrent changes.
#[derive(Debug, Clone)]
pub struct NewRoleChange {
    pub user_id: Uuid,
    pub new_role: Role,
    pub changed_by_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_accounts_default_to_customer() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn only_dev_and_admin_are_protected() {
        assert!(Role::Dev.is_protected());
        assert!(Role::Admin.is_protected());
        assert!(!Role::User.is_protected());
        assert!(!Role::Customer.is_protected());
    }
}
