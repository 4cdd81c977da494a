use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::infra::error::InfraError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS documents_email_lower_idx
    ON documents (collection, lower(data ->> 'email'));
"#;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(InfraError::DatabaseConnection)?;

    info!("Connected to database!");

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Creates the documents table and its email index if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), InfraError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(InfraError::Schema)?;
    Ok(())
}
