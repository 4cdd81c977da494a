use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder, Row, postgres::PgRow, types::Json};

use crate::{
    adapters::persistence::{PostgresDocumentStore, into_document},
    app_error::{AppError, AppResult},
    application::ports::document_store::{Document, DocumentStore, Filter, StoredDocument},
    domain::entities::collection::Collection,
};

/// Exact filters fold into one JSONB containment object; case-insensitive
/// filters become `(field, value)` pairs compared with `lower()`.
fn split_filters(filters: &[Filter]) -> (Document, Vec<(String, String)>) {
    let mut exact = Document::new();
    let mut folded = Vec::new();
    for filter in filters {
        match filter {
            Filter::Eq { field, value } => {
                exact.insert(field.clone(), value.clone());
            }
            Filter::EqIgnoreCase { field, value } => {
                folded.push((field.clone(), value.clone()));
            }
        }
    }
    (exact, folded)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        match row {
            Some(row) => {
                let data: Value = row.try_get("data")?;
                Ok(Some(into_document(data, collection.as_str(), id)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, collection: Collection, id: &str, doc: Document) -> AppResult<()> {
        sqlx::query(
            r#"
                INSERT INTO documents (collection, id, data)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE
                SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(doc)))
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn update(&self, collection: Collection, id: &str, patch: Document) -> AppResult<()> {
        let result = sqlx::query(
            r#"
                UPDATE documents
                SET data = data || $3, updated_at = now()
                WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> AppResult<Vec<StoredDocument>> {
        let (exact, folded) = split_filters(filters);

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.as_str());
        if !exact.is_empty() {
            qb.push(" AND data @> ");
            qb.push_bind(Json(Value::Object(exact)));
        }
        for (field, value) in folded {
            qb.push(" AND lower(data ->> ");
            qb.push_bind(field);
            qb.push(") = lower(");
            qb.push_bind(value);
            qb.push(")");
        }
        qb.push(" ORDER BY created_at, id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows_to_documents(rows, collection)
    }

    async fn page(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<StoredDocument>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
                SELECT id, data FROM documents
                WHERE collection = $1 AND ($2::text IS NULL OR id > $2)
                ORDER BY id
                LIMIT $3
            "#,
        )
        .bind(collection.as_str())
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        rows_to_documents(rows, collection)
    }
}

fn rows_to_documents(rows: Vec<PgRow>, collection: Collection) -> AppResult<Vec<StoredDocument>> {
    rows.into_iter()
        .map(|row| -> AppResult<StoredDocument> {
            let id: String = row.try_get("id")?;
            let data: Value = row.try_get("data")?;
            let data = into_document(data, collection.as_str(), &id)?;
            Ok(StoredDocument { id, data })
        })
        .collect()
}
