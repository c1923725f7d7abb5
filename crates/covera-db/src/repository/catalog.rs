//! SurrealDB implementation of [`CatalogRepository`].
//!
//! Entitlement rules use a deterministic record id built from the
//! (type, service) pair, which makes `define_rule` a natural UPSERT and
//! guarantees at most one rule per pair independently of the unique index.

use chrono::{DateTime, Utc};
use covera_core::error::CoveraResult;
use covera_core::models::catalog::{
    CreateWarrantyService, CreateWarrantyType, DefineRule, EntitlementRule, WarrantyService,
    WarrantyType,
};
use covera_core::repository::CatalogRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CatalogRow {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CatalogRowWithId {
    record_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RuleRow {
    warranty_type_id: String,
    warranty_service_id: String,
    max_uses: u32,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn row_to_type(row: CatalogRow, id: Uuid) -> WarrantyType {
    WarrantyType {
        id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_service(row: CatalogRow, id: Uuid) -> WarrantyService {
    WarrantyService {
        id,
        name: row.name,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

impl RuleRow {
    fn try_into_rule(self) -> Result<EntitlementRule, DbError> {
        Ok(EntitlementRule {
            warranty_type_id: parse_uuid(&self.warranty_type_id, "warranty type")?,
            warranty_service_id: parse_uuid(&self.warranty_service_id, "warranty service")?,
            max_uses: self.max_uses,
        })
    }
}

/// Record id for the rule of a (type, service) pair.
fn rule_record_id(warranty_type_id: Uuid, warranty_service_id: Uuid) -> String {
    format!("{warranty_type_id}_{warranty_service_id}")
}

/// SurrealDB implementation of the warranty catalog repository.
#[derive(Clone)]
pub struct SurrealCatalogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCatalogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn create_named(
        &self,
        table: &'static str,
        name: String,
        description: String,
    ) -> CoveraResult<(CatalogRow, Uuid)> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record($table, $id) SET \
                 name = $name, description = $description",
            )
            .bind(("table", table))
            .bind(("id", id_str.clone()))
            .bind(("name", name))
            .bind(("description", description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<CatalogRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: table.into(),
            id: id_str,
        })?;

        Ok((row, id))
    }

    async fn get_named(&self, table: &'static str, id: Uuid) -> CoveraResult<(CatalogRow, Uuid)> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record($table, $id)")
            .bind(("table", table))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CatalogRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: table.into(),
            id: id_str,
        })?;

        Ok((row, id))
    }

    async fn list_named(&self, table: &'static str) -> CoveraResult<Vec<(CatalogRow, Uuid)>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::table($table) \
                 ORDER BY name ASC",
            )
            .bind(("table", table))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CatalogRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| {
                let id = parse_uuid(&row.record_id, table)?;
                Ok((
                    CatalogRow {
                        name: row.name,
                        description: row.description,
                        created_at: row.created_at,
                        updated_at: row.updated_at,
                    },
                    id,
                ))
            })
            .collect::<Result<_, DbError>>()
            .map_err(Into::into)
    }
}

impl<C: Connection> CatalogRepository for SurrealCatalogRepository<C> {
    async fn create_type(&self, input: CreateWarrantyType) -> CoveraResult<WarrantyType> {
        let (row, id) = self
            .create_named("warranty_type", input.name, input.description)
            .await?;
        Ok(row_to_type(row, id))
    }

    async fn get_type(&self, id: Uuid) -> CoveraResult<WarrantyType> {
        let (row, id) = self.get_named("warranty_type", id).await?;
        Ok(row_to_type(row, id))
    }

    async fn list_types(&self) -> CoveraResult<Vec<WarrantyType>> {
        let rows = self.list_named("warranty_type").await?;
        Ok(rows
            .into_iter()
            .map(|(row, id)| row_to_type(row, id))
            .collect())
    }

    async fn create_service(&self, input: CreateWarrantyService) -> CoveraResult<WarrantyService> {
        let (row, id) = self
            .create_named("warranty_service", input.name, input.description)
            .await?;
        Ok(row_to_service(row, id))
    }

    async fn get_service(&self, id: Uuid) -> CoveraResult<WarrantyService> {
        let (row, id) = self.get_named("warranty_service", id).await?;
        Ok(row_to_service(row, id))
    }

    async fn list_services(&self) -> CoveraResult<Vec<WarrantyService>> {
        let rows = self.list_named("warranty_service").await?;
        Ok(rows
            .into_iter()
            .map(|(row, id)| row_to_service(row, id))
            .collect())
    }

    async fn define_rule(&self, input: DefineRule) -> CoveraResult<EntitlementRule> {
        let record_id = rule_record_id(input.warranty_type_id, input.warranty_service_id);

        let result = self
            .db
            .query(
                "UPSERT type::record('warranty_type_service', $id) SET \
                 warranty_type_id = $warranty_type_id, \
                 warranty_service_id = $warranty_service_id, \
                 max_uses = $max_uses",
            )
            .bind(("id", record_id.clone()))
            .bind(("warranty_type_id", input.warranty_type_id.to_string()))
            .bind(("warranty_service_id", input.warranty_service_id.to_string()))
            .bind(("max_uses", input.max_uses))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "warranty_type_service".into(),
            id: record_id,
        })?;

        Ok(row.try_into_rule()?)
    }

    async fn rule_for(
        &self,
        warranty_type_id: Uuid,
        warranty_service_id: Uuid,
    ) -> CoveraResult<Option<EntitlementRule>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM warranty_type_service \
                 WHERE warranty_type_id = $warranty_type_id \
                 AND warranty_service_id = $warranty_service_id",
            )
            .bind(("warranty_type_id", warranty_type_id.to_string()))
            .bind(("warranty_service_id", warranty_service_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_rule().map_err(Into::into))
            .transpose()
    }

    async fn rules_for_type(&self, warranty_type_id: Uuid) -> CoveraResult<Vec<EntitlementRule>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM warranty_type_service \
                 WHERE warranty_type_id = $warranty_type_id",
            )
            .bind(("warranty_type_id", warranty_type_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_rule().map_err(Into::into))
            .collect()
    }
}
