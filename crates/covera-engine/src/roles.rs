//! Role assignment orchestration.

use covera_core::error::{CoveraError, CoveraResult};
use covera_core::models::role::{Actor, NewRoleChange, Role, RoleChangeRecord};
use covera_core::repository::RoleDirectory;
use tracing::{info, warn};
use uuid::Uuid;

use crate::authorizer::authorize_role_change;

/// Role administration service.
///
/// Generic over the directory implementation so the engine has no
/// dependency on the database crate.
pub struct RoleService<D: RoleDirectory> {
    directory: D,
}

impl<D: RoleDirectory> RoleService<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Change `target_id`'s role to `new_role` on behalf of `actor`.
    ///
    /// Denials carry the specific reason (self-change, protected target,
    /// insufficient privilege). On success the role write and the audit
    /// append commit as one storage transaction, and the resulting change
    /// record is returned.
    pub async fn change_role(
        &self,
        actor: &Actor,
        target_id: Uuid,
        new_role: Role,
    ) -> CoveraResult<RoleChangeRecord> {
        // 1. Target's current role; accounts without an assignment read
        //    as Customer.
        let current_role = self.directory.role_of(target_id).await?;

        // 2. Authorize against both the current and the requested role.
        if let Err(reason) = authorize_role_change(actor, target_id, current_role, new_role) {
            warn!(
                actor_id = %actor.id,
                target_id = %target_id,
                reason = %reason,
                "role change denied"
            );
            return Err(CoveraError::PermissionDenied { reason });
        }

        // 3. Role write + audit append as a single atomic unit.
        let record = self
            .directory
            .assign_role_recorded(NewRoleChange {
                user_id: target_id,
                new_role,
                changed_by_id: actor.id,
            })
            .await?;

        info!(
            target_id = %target_id,
            old_role = ?record.old_role,
            new_role = ?record.new_role,
            changed_by = %actor.id,
            "role changed"
        );

        Ok(record)
    }

    /// Current role for a user (unassigned accounts are `Customer`).
    pub async fn role_of(&self, user_id: Uuid) -> CoveraResult<Role> {
        self.directory.role_of(user_id).await
    }

    /// Role-change history for one user, newest first.
    pub async fn history(&self, user_id: Uuid) -> CoveraResult<Vec<RoleChangeRecord>> {
        self.directory.changes_for(user_id).await
    }

    /// Most recent role changes across all users.
    pub async fn recent_changes(&self, limit: u64) -> CoveraResult<Vec<RoleChangeRecord>> {
        self.directory.recent_changes(limit).await
    }
}
