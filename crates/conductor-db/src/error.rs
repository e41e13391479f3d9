//! Database-specific error types and conversions.

use conductor_core::error::ConductorError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The client call itself failed (connection, protocol, parse).
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    /// A statement was rejected by the database.
    #[error("Query failed: {0}")]
    Query(String),

    /// A statement hit a unique index, an existing record id, or a
    /// transaction conflict.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Malformed row: {0}")]
    Decode(String),
}

impl DbError {
    /// Classify an error reported by `Response::check`.
    pub(crate) fn from_statement(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("already exists")
            || lowered.contains("already contains")
            || lowered.contains("conflict")
        {
            DbError::Conflict(message)
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for ConductorError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ConductorError::NotFound { entity, id },
            other => ConductorError::Database(other.to_string()),
        }
    }
}
