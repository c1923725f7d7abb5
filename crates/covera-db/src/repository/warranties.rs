//! SurrealDB implementation of [`WarrantyRepository`].

use chrono::{DateTime, Utc};
use covera_core::error::{CoveraError, CoveraResult};
use covera_core::models::warranty::{
    ApprovalDecision, ApprovalStatus, CreateWarranty, Warranty, WarrantyStatus,
};
use covera_core::repository::WarrantyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, thrown, thrown_marker};

fn parse_approval(s: &str) -> Result<ApprovalStatus, DbError> {
    match s {
        "Pending" => Ok(ApprovalStatus::Pending),
        "Approved" => Ok(ApprovalStatus::Approved),
        "Rejected" => Ok(ApprovalStatus::Rejected),
        other => Err(DbError::Migration(format!(
            "unknown approval status: {other}"
        ))),
    }
}

fn approval_to_string(s: ApprovalStatus) -> &'static str {
    match s {
        ApprovalStatus::Pending => "Pending",
        ApprovalStatus::Approved => "Approved",
        ApprovalStatus::Rejected => "Rejected",
    }
}

fn parse_status(s: &str) -> Result<WarrantyStatus, DbError> {
    match s {
        "Active" => Ok(WarrantyStatus::Active),
        "Inactive" => Ok(WarrantyStatus::Inactive),
        other => Err(DbError::Migration(format!(
            "unknown warranty status: {other}"
        ))),
    }
}

fn status_to_string(s: WarrantyStatus) -> &'static str {
    match s {
        WarrantyStatus::Active => "Active",
        WarrantyStatus::Inactive => "Inactive",
    }
}

#[derive(Debug, SurrealValue)]
struct WarrantyRow {
    user_id: String,
    address_id: String,
    warranty_type_id: String,
    warranty_start: DateTime<Utc>,
    warranty_end: DateTime<Utc>,
    approval_status: String,
    status: String,
    approved_at: Option<DateTime<Utc>>,
    approved_by_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct WarrantyRowWithId {
    record_id: String,
    user_id: String,
    address_id: String,
    warranty_type_id: String,
    warranty_start: DateTime<Utc>,
    warranty_end: DateTime<Utc>,
    approval_status: String,
    status: String,
    approved_at: Option<DateTime<Utc>>,
    approved_by_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn row_to_warranty(row: WarrantyRow, id: Uuid) -> Result<Warranty, DbError> {
    let approved_by_id = row
        .approved_by_id
        .as_deref()
        .map(|s| parse_uuid(s, "approver"))
        .transpose()?;
    Ok(Warranty {
        id,
        user_id: parse_uuid(&row.user_id, "user")?,
        address_id: parse_uuid(&row.address_id, "address")?,
        warranty_type_id: parse_uuid(&row.warranty_type_id, "warranty type")?,
        warranty_start: row.warranty_start,
        warranty_end: row.warranty_end,
        approval_status: parse_approval(&row.approval_status)?,
        status: parse_status(&row.status)?,
        approved_at: row.approved_at,
        approved_by_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl WarrantyRowWithId {
    fn try_into_warranty(self) -> Result<Warranty, DbError> {
        let id = parse_uuid(&self.record_id, "warranty")?;
        row_to_warranty(
            WarrantyRow {
                user_id: self.user_id,
                address_id: self.address_id,
                warranty_type_id: self.warranty_type_id,
                warranty_start: self.warranty_start,
                warranty_end: self.warranty_end,
                approval_status: self.approval_status,
                status: self.status,
                approved_at: self.approved_at,
                approved_by_id: self.approved_by_id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Warranty repository.
#[derive(Clone)]
pub struct SurrealWarrantyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWarrantyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WarrantyRepository for SurrealWarrantyRepository<C> {
    async fn create(&self, input: CreateWarranty) -> CoveraResult<Warranty> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('warranty', $id) SET \
                 user_id = $user_id, \
                 address_id = $address_id, \
                 warranty_type_id = $warranty_type_id, \
                 warranty_start = $warranty_start, \
                 warranty_end = $warranty_end, \
                 approval_status = 'Pending', \
                 status = $status, \
                 approved_at = NONE, \
                 approved_by_id = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("address_id", input.address_id.to_string()))
            .bind(("warranty_type_id", input.warranty_type_id.to_string()))
            .bind(("warranty_start", input.warranty_start))
            .bind(("warranty_end", input.warranty_end))
            .bind(("status", status_to_string(input.status).to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<WarrantyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "warranty".into(),
            id: id_str,
        })?;

        Ok(row_to_warranty(row, id)?)
    }

    async fn get(&self, id: Uuid) -> CoveraResult<Warranty> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('warranty', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WarrantyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "warranty".into(),
            id: id_str,
        })?;

        Ok(row_to_warranty(row, id)?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoveraResult<Vec<Warranty>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM warranty \
                 WHERE user_id = $user_id ORDER BY created_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WarrantyRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_warranty().map_err(Into::into))
            .collect()
    }

    async fn list_pending(&self) -> CoveraResult<Vec<Warranty>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM warranty \
                 WHERE approval_status = 'Pending' ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WarrantyRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_warranty().map_err(Into::into))
            .collect()
    }

    async fn decide_if_pending(
        &self,
        warranty_id: Uuid,
        approver_id: Uuid,
        decision: ApprovalDecision,
    ) -> CoveraResult<Warranty> {
        // The pending check and the decision write are one transaction:
        // of two concurrent decisions exactly one commits, the other
        // aborts on the THROW below.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $current = \
                     (SELECT VALUE approval_status \
                      FROM type::record('warranty', $id))[0]; \
                 IF $current == NONE { THROW 'covera:warranty_not_found' }; \
                 IF $current != 'Pending' { THROW 'covera:already_decided' }; \
                 UPDATE type::record('warranty', $id) SET \
                     approval_status = $decision, \
                     approved_at = time::now(), \
                     approved_by_id = $approver, \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", warranty_id.to_string()))
            .bind((
                "decision",
                approval_to_string(decision.as_status()).to_string(),
            ))
            .bind(("approver", approver_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| match thrown_marker(&e) {
            Some(thrown::WARRANTY_NOT_FOUND) => CoveraError::NotFound {
                entity: "warranty".into(),
                id: warranty_id.to_string(),
            },
            Some(thrown::ALREADY_DECIDED) => CoveraError::AlreadyDecided { warranty_id },
            _ => DbError::from(e).into(),
        })?;

        // Statements: 0 LET, 1-2 the guards, 3 the UPDATE.
        let rows: Vec<WarrantyRow> = result.take(3).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "warranty".into(),
            id: warranty_id.to_string(),
        })?;

        Ok(row_to_warranty(row, warranty_id)?)
    }
}
