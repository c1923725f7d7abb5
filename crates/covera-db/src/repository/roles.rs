//! SurrealDB implementation of [`RoleDirectory`].
//!
//! Role assignments live in `user_role` with the user's UUID as the record
//! id, so a user has at most one role row by construction. The change
//! trail lives in the append-only `role_change` table and is written in
//! the same transaction as the assignment.

use chrono::{DateTime, Utc};
use covera_core::error::CoveraResult;
use covera_core::models::role::{NewRoleChange, Role, RoleChangeRecord};
use covera_core::repository::RoleDirectory;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Dev" => Ok(Role::Dev),
        "Admin" => Ok(Role::Admin),
        "User" => Ok(Role::User),
        "Customer" => Ok(Role::Customer),
        other => Err(DbError::Migration(format!("unknown role: {other}"))),
    }
}

pub(crate) fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Dev => "Dev",
        Role::Admin => "Admin",
        Role::User => "User",
        Role::Customer => "Customer",
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRow {
    role: String,
}

/// Row for the `role_change` record created inside the assignment
/// transaction, where the record id is already known.
#[derive(Debug, SurrealValue)]
struct RoleChangeRow {
    user_id: String,
    old_role: String,
    new_role: String,
    changed_by_id: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleChangeRowWithId {
    record_id: String,
    user_id: String,
    old_role: String,
    new_role: String,
    changed_by_id: String,
    timestamp: DateTime<Utc>,
}

fn row_to_record(row: RoleChangeRow, id: Uuid) -> Result<RoleChangeRecord, DbError> {
    let user_id = Uuid::parse_str(&row.user_id)
        .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
    let changed_by_id = Uuid::parse_str(&row.changed_by_id)
        .map_err(|e| DbError::Migration(format!("invalid actor UUID: {e}")))?;
    Ok(RoleChangeRecord {
        id,
        user_id,
        old_role: parse_role(&row.old_role)?,
        new_role: parse_role(&row.new_role)?,
        changed_by_id,
        timestamp: row.timestamp,
    })
}

impl RoleChangeRowWithId {
    fn try_into_record(self) -> Result<RoleChangeRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        row_to_record(
            RoleChangeRow {
                user_id: self.user_id,
                old_role: self.old_role,
                new_role: self.new_role,
                changed_by_id: self.changed_by_id,
                timestamp: self.timestamp,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the role directory.
#[derive(Clone)]
pub struct SurrealRoleDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleDirectory for SurrealRoleDirectory<C> {
    async fn role_of(&self, user_id: Uuid) -> CoveraResult<Role> {
        let mut result = self
            .db
            .query("SELECT role FROM type::record('user_role', $id)")
            .bind(("id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(parse_role(&row.role)?),
            // No explicit assignment: the account is a plain customer.
            None => Ok(Role::Customer),
        }
    }

    async fn assign_role_recorded(&self, change: NewRoleChange) -> CoveraResult<RoleChangeRecord> {
        let change_id = Uuid::new_v4();

        // The old role is read inside the transaction, so the audit record
        // and the assignment can never disagree, and both writes commit or
        // neither does.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $old = \
                     (SELECT VALUE role FROM type::record('user_role', $target))[0] \
                     ?? 'Customer'; \
                 UPSERT type::record('user_role', $target) SET \
                     role = $new_role, \
                     updated_at = time::now(); \
                 CREATE type::record('role_change', $change_id) SET \
                     user_id = $target, \
                     old_role = $old, \
                     new_role = $new_role, \
                     changed_by_id = $actor; \
                 COMMIT TRANSACTION;",
            )
            .bind(("target", change.user_id.to_string()))
            .bind(("new_role", role_to_string(change.new_role).to_string()))
            .bind(("change_id", change_id.to_string()))
            .bind(("actor", change.changed_by_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        // Statement 0 is the LET, 1 the UPSERT, 2 the CREATE.
        let rows: Vec<RoleChangeRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role_change".into(),
            id: change_id.to_string(),
        })?;

        Ok(row_to_record(row, change_id)?)
    }

    async fn changes_for(&self, user_id: Uuid) -> CoveraResult<Vec<RoleChangeRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_change \
                 WHERE user_id = $user_id ORDER BY timestamp DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleChangeRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_record().map_err(Into::into))
            .collect()
    }

    async fn recent_changes(&self, limit: u64) -> CoveraResult<Vec<RoleChangeRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_change \
                 ORDER BY timestamp DESC LIMIT $limit",
            )
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleChangeRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_record().map_err(Into::into))
            .collect()
    }
}
