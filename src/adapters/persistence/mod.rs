use serde_json::Value;
use sqlx::PgPool;

use crate::{app_error::AppError, application::ports::document_store::Document};

pub mod documents;

/// Document store backed by a single Postgres `documents` table holding one
/// JSONB object per `(collection, id)`.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresDocumentStore { pool }
    }
}

/// Unwraps a JSONB column into a document; anything but an object is corrupt.
pub(crate) fn into_document(value: Value, collection: &str, id: &str) -> Result<Document, AppError> {
    match value {
        Value::Object(map) => Ok(map),
        other => {
            tracing::error!(
                collection = collection,
                document_id = id,
                kind = json_kind(&other),
                "Stored document is not a JSON object"
            );
            Err(AppError::Internal("Stored document is not an object".into()))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL not-null violation
                if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidInput("Required field is missing".into())
                } else {
                    // Log the actual error for debugging, but don't expose details
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
