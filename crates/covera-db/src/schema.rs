//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity. UUIDs are
//! stored as strings. Enums are stored as strings with ASSERT constraints
//! for validation. The `role_change` table is append-only at the
//! permission level.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Role assignments (record id = user id; absence reads as Customer)
-- =======================================================================
DEFINE TABLE user_role SCHEMAFULL;
DEFINE FIELD role ON TABLE user_role TYPE string \
    ASSERT $value IN ['Dev', 'Admin', 'User', 'Customer'];
DEFINE FIELD updated_at ON TABLE user_role TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Role change trail (append-only)
-- =======================================================================
DEFINE TABLE role_change SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD user_id ON TABLE role_change TYPE string;
DEFINE FIELD old_role ON TABLE role_change TYPE string \
    ASSERT $value IN ['Dev', 'Admin', 'User', 'Customer'];
DEFINE FIELD new_role ON TABLE role_change TYPE string \
    ASSERT $value IN ['Dev', 'Admin', 'User', 'Customer'];
DEFINE FIELD changed_by_id ON TABLE role_change TYPE string;
DEFINE FIELD timestamp ON TABLE role_change TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_change_user_time ON TABLE role_change \
    COLUMNS user_id, timestamp;

-- =======================================================================
-- Warranty types
-- =======================================================================
DEFINE TABLE warranty_type SCHEMAFULL;
DEFINE FIELD name ON TABLE warranty_type TYPE string;
DEFINE FIELD description ON TABLE warranty_type TYPE string;
DEFINE FIELD created_at ON TABLE warranty_type TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE warranty_type TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_warranty_type_name ON TABLE warranty_type \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Warranty services
-- =======================================================================
DEFINE TABLE warranty_service SCHEMAFULL;
DEFINE FIELD name ON TABLE warranty_service TYPE string;
DEFINE FIELD description ON TABLE warranty_service TYPE string;
DEFINE FIELD created_at ON TABLE warranty_service TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE warranty_service TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_warranty_service_name ON TABLE warranty_service \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Entitlement rules (one per (type, service) pair)
-- =======================================================================
DEFINE TABLE warranty_type_service SCHEMAFULL;
DEFINE FIELD warranty_type_id ON TABLE warranty_type_service TYPE string;
DEFINE FIELD warranty_service_id ON TABLE warranty_type_service \
    TYPE string;
DEFINE FIELD max_uses ON TABLE warranty_type_service TYPE int \
    ASSERT $value >= 0;
DEFINE INDEX idx_rule_type_service ON TABLE warranty_type_service \
    COLUMNS warranty_type_id, warranty_service_id UNIQUE;

-- =======================================================================
-- Warranties
-- =======================================================================
DEFINE TABLE warranty SCHEMAFULL;
DEFINE FIELD user_id ON TABLE warranty TYPE string;
DEFINE FIELD address_id ON TABLE warranty TYPE string;
DEFINE FIELD warranty_type_id ON TABLE warranty TYPE string;
DEFINE FIELD warranty_start ON TABLE warranty TYPE datetime;
DEFINE FIELD warranty_end ON TABLE warranty TYPE datetime;
DEFINE FIELD approval_status ON TABLE warranty TYPE string \
    ASSERT $value IN ['Pending', 'Approved', 'Rejected'];
DEFINE FIELD status ON TABLE warranty TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD approved_at ON TABLE warranty TYPE option<datetime>;
DEFINE FIELD approved_by_id ON TABLE warranty TYPE option<string>;
DEFINE FIELD created_at ON TABLE warranty TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE warranty TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_warranty_user ON TABLE warranty COLUMNS user_id;
DEFINE INDEX idx_warranty_approval ON TABLE warranty \
    COLUMNS approval_status;

-- =======================================================================
-- Service requests
-- =======================================================================
DEFINE TABLE service_request SCHEMAFULL;
DEFINE FIELD warranty_id ON TABLE service_request TYPE string;
DEFINE FIELD warranty_service_id ON TABLE service_request TYPE string;
DEFINE FIELD user_id ON TABLE service_request TYPE string;
DEFINE FIELD status ON TABLE service_request TYPE string \
    ASSERT $value IN ['Pending', 'Scheduled', 'InProgress', \
    'Completed', 'Cancelled'];
DEFINE FIELD scheduled_date ON TABLE service_request \
    TYPE option<datetime>;
DEFINE FIELD completed_date ON TABLE service_request \
    TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE service_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_request_warranty_service ON TABLE service_request \
    COLUMNS warranty_id, warranty_service_id;
DEFINE INDEX idx_request_user ON TABLE service_request COLUMNS user_id;
";

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies each
/// migration whose version exceeds the current maximum. All DEFINE
/// statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that bypass the
/// migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
