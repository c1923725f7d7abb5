//! Database-specific error types and conversions.

use covera_core::error::CoveraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for CoveraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoveraError::NotFound { entity, id },
            other => CoveraError::Storage(other.to_string()),
        }
    }
}

/// Marker strings thrown inside SurrealQL transactions to signal
/// business-rule rejections out of an aborted transaction. The repository
/// code matches them in the surfaced error and rebuilds the corresponding
/// [`CoveraError`] variant.
pub(crate) mod thrown {
    pub const WARRANTY_NOT_FOUND: &str = "covera:warranty_not_found";
    pub const ALREADY_DECIDED: &str = "covera:already_decided";
    pub const NOT_ENTITLED: &str = "covera:not_entitled";
    pub const QUOTA_EXCEEDED: &str = "covera:quota_exceeded";
}

/// Which marker, if any, a failed transaction threw.
pub(crate) fn thrown_marker(err: &surrealdb::Error) -> Option<&'static str> {
    let msg = err.to_string();
    [
        thrown::WARRANTY_NOT_FOUND,
        thrown::ALREADY_DECIDED,
        thrown::NOT_ENTITLED,
        thrown::QUOTA_EXCEEDED,
    ]
    .into_iter()
    .find(|marker| msg.contains(marker))
}
