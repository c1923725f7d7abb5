//! SurrealDB implementation of [`ServiceRequestRepository`].
//!
//! The quota ceiling is enforced inside the creation transaction itself —
//! the rule lookup, the non-cancelled count, and the insert are one atomic
//! unit, so two racing creations against one remaining slot can never both
//! commit. Status updates are compare-and-swap on the previously observed
//! status.

use chrono::{DateTime, Utc};
use covera_core::error::{CoveraError, CoveraResult};
use covera_core::models::service_request::{CreateServiceRequest, RequestStatus, ServiceRequest};
use covera_core::repository::ServiceRequestRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, thrown, thrown_marker};

pub(crate) fn parse_request_status(s: &str) -> Result<RequestStatus, DbError> {
    match s {
        "Pending" => Ok(RequestStatus::Pending),
        "Scheduled" => Ok(RequestStatus::Scheduled),
        "InProgress" => Ok(RequestStatus::InProgress),
        "Completed" => Ok(RequestStatus::Completed),
        "Cancelled" => Ok(RequestStatus::Cancelled),
        other => Err(DbError::Migration(format!(
            "unknown request status: {other}"
        ))),
    }
}

pub(crate) fn request_status_to_string(s: RequestStatus) -> &'static str {
    match s {
        RequestStatus::Pending => "Pending",
        RequestStatus::Scheduled => "Scheduled",
        RequestStatus::InProgress => "InProgress",
        RequestStatus::Completed => "Completed",
        RequestStatus::Cancelled => "Cancelled",
    }
}

#[derive(Debug, SurrealValue)]
struct RequestRow {
    warranty_id: String,
    warranty_service_id: String,
    user_id: String,
    status: String,
    created_at: DateTime<Utc>,
    scheduled_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct RequestRowWithId {
    record_id: String,
    warranty_id: String,
    warranty_service_id: String,
    user_id: String,
    status: String,
    created_at: DateTime<Utc>,
    scheduled_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct TypeIdRow {
    warranty_type_id: String,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn row_to_request(row: RequestRow, id: Uuid) -> Result<ServiceRequest, DbError> {
    Ok(ServiceRequest {
        id,
        warranty_id: parse_uuid(&row.warranty_id, "warranty")?,
        warranty_service_id: parse_uuid(&row.warranty_service_id, "warranty service")?,
        user_id: parse_uuid(&row.user_id, "user")?,
        status: parse_request_status(&row.status)?,
        created_at: row.created_at,
        scheduled_date: row.scheduled_date,
        completed_date: row.completed_date,
    })
}

impl RequestRowWithId {
    fn try_into_request(self) -> Result<ServiceRequest, DbError> {
        let id = parse_uuid(&self.record_id, "request")?;
        row_to_request(
            RequestRow {
                warranty_id: self.warranty_id,
                warranty_service_id: self.warranty_service_id,
                user_id: self.user_id,
                status: self.status,
                created_at: self.created_at,
                scheduled_date: self.scheduled_date,
                completed_date: self.completed_date,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the service request repository.
#[derive(Clone)]
pub struct SurrealServiceRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Error-path read used to give `NotEntitled` its warranty-type
    /// context; by this point the transaction has already aborted.
    async fn warranty_type_of(&self, warranty_id: Uuid) -> CoveraResult<Uuid> {
        let mut result = self
            .db
            .query("SELECT warranty_type_id FROM type::record('warranty', $id)")
            .bind(("id", warranty_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TypeIdRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "warranty".into(),
            id: warranty_id.to_string(),
        })?;

        Ok(parse_uuid(&row.warranty_type_id, "warranty type")?)
    }
}

impl<C: Connection> ServiceRequestRepository for SurrealServiceRequestRepository<C> {
    async fn create_within_quota(&self, input: CreateServiceRequest) -> CoveraResult<ServiceRequest> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $type_id = \
                     (SELECT VALUE warranty_type_id \
                      FROM type::record('warranty', $warranty_id))[0]; \
                 IF $type_id == NONE { THROW 'covera:warranty_not_found' }; \
                 LET $ceiling = \
                     (SELECT VALUE max_uses FROM warranty_type_service \
                      WHERE warranty_type_id = $type_id \
                      AND warranty_service_id = $service_id)[0]; \
                 IF $ceiling == NONE { THROW 'covera:not_entitled' }; \
                 LET $used = count( \
                     SELECT * FROM service_request \
                     WHERE warranty_id = $warranty_id \
                     AND warranty_service_id = $service_id \
                     AND status != 'Cancelled'); \
                 IF $used >= $ceiling { THROW 'covera:quota_exceeded' }; \
                 CREATE type::record('service_request', $id) SET \
                     warranty_id = $warranty_id, \
                     warranty_service_id = $service_id, \
                     user_id = $user_id, \
                     status = 'Pending', \
                     scheduled_date = NONE, \
                     completed_date = NONE; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("warranty_id", input.warranty_id.to_string()))
            .bind(("service_id", input.warranty_service_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let result = result.check();
        let mut result = match result {
            Ok(result) => result,
            Err(e) => {
                return Err(match thrown_marker(&e) {
                    Some(thrown::WARRANTY_NOT_FOUND) => CoveraError::NotFound {
                        entity: "warranty".into(),
                        id: input.warranty_id.to_string(),
                    },
                    Some(thrown::NOT_ENTITLED) => CoveraError::NotEntitled {
                        warranty_type_id: self.warranty_type_of(input.warranty_id).await?,
                        warranty_service_id: input.warranty_service_id,
                    },
                    Some(thrown::QUOTA_EXCEEDED) => CoveraError::QuotaExceeded {
                        warranty_id: input.warranty_id,
                        warranty_service_id: input.warranty_service_id,
                    },
                    _ => DbError::from(e).into(),
                });
            }
        };

        // Statements: 0/2/4 the LETs, 1/3/5 the guards, 6 the CREATE.
        let rows: Vec<RequestRow> = result.take(6).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_request".into(),
            id: id.to_string(),
        })?;

        Ok(row_to_request(row, id)?)
    }

    async fn get(&self, id: Uuid) -> CoveraResult<ServiceRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('service_request', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service_request".into(),
            id: id_str,
        })?;

        Ok(row_to_request(row, id)?)
    }

    async fn list_for_warranty(&self, warranty_id: Uuid) -> CoveraResult<Vec<ServiceRequest>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service_request \
                 WHERE warranty_id = $warranty_id ORDER BY created_at DESC",
            )
            .bind(("warranty_id", warranty_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_request().map_err(Into::into))
            .collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoveraResult<Vec<ServiceRequest>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service_request \
                 WHERE user_id = $user_id ORDER BY created_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_request().map_err(Into::into))
            .collect()
    }

    async fn count_active(
        &self,
        warranty_id: Uuid,
        warranty_service_id: Uuid,
    ) -> CoveraResult<u32> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM service_request \
                 WHERE warranty_id = $warranty_id \
                 AND warranty_service_id = $service_id \
                 AND status != 'Cancelled' GROUP ALL",
            )
            .bind(("warranty_id", warranty_id.to_string()))
            .bind(("service_id", warranty_service_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|row| row.total as u32).unwrap_or(0))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        scheduled_date: Option<DateTime<Utc>>,
    ) -> CoveraResult<Option<ServiceRequest>> {
        // Conditional UPDATE doubles as the compare-and-swap: zero rows
        // back means the stored status no longer matches `from`.
        let sql = match (to, scheduled_date.is_some()) {
            (RequestStatus::Completed, _) => {
                "UPDATE type::record('service_request', $id) SET \
                 status = $to, completed_date = time::now() \
                 WHERE status = $from"
            }
            (_, true) => {
                "UPDATE type::record('service_request', $id) SET \
                 status = $to, scheduled_date = $scheduled_date \
                 WHERE status = $from"
            }
            (_, false) => {
                "UPDATE type::record('service_request', $id) SET \
                 status = $to WHERE status = $from"
            }
        };

        let mut query = self
            .db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(("to", request_status_to_string(to).to_string()))
            .bind(("from", request_status_to_string(from).to_string()));
        if to != RequestStatus::Completed {
            if let Some(when) = scheduled_date {
                query = query.bind(("scheduled_date", when));
            }
        }

        let result = query.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row_to_request(row, id).map_err(Into::into))
            .transpose()
    }
}
