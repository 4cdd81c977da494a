use crate::{adapters::persistence::PostgresDocumentStore, infra::db::init_db};

pub mod config;
pub mod db;
pub mod error;
pub mod reconcile_worker;
pub mod setup;

pub async fn postgres_document_store(
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<PostgresDocumentStore> {
    let pool = init_db(database_url, max_connections).await?;
    Ok(PostgresDocumentStore::new(pool))
}
