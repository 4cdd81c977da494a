use async_trait::async_trait;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::collection::Collection,
};

/// Top-level fields of a stored document.
pub type Document = Map<String, Value>;

const AUTO_ID_LEN: usize = 20;

/// A document returned by [`DocumentStore::query`] together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Equality filter applied to a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    /// Text equality ignoring ASCII and Unicode case.
    EqIgnoreCase { field: String, value: String },
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn eq_ignore_case(field: &str, value: &str) -> Self {
        Filter::EqIgnoreCase {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Evaluates the filter against a document held in memory.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => doc.get(field) == Some(value),
            Filter::EqIgnoreCase { field, value } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|stored| stored.to_lowercase() == value.to_lowercase()),
        }
    }
}

/// Schemaless per-collection key/value documents.
///
/// `update` merges top-level fields into an existing document and fails with
/// [`AppError::NotFound`] when the document does not exist; `set` creates or
/// replaces the whole document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Document>>;
    async fn set(&self, collection: Collection, id: &str, doc: Document) -> AppResult<()>;
    async fn update(&self, collection: Collection, id: &str, patch: Document) -> AppResult<()>;
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> AppResult<Vec<StoredDocument>>;
    /// Up to `limit` documents whose id sorts after `after`, in id order.
    async fn page(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<StoredDocument>>;

    /// Id for a document about to be created.
    fn generate_id(&self) -> String {
        generate_document_id()
    }
}

/// Random 20-character alphanumeric id, the shape hosted document stores use
/// for auto-generated keys.
pub fn generate_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

pub fn to_document<T: Serialize>(value: &T) -> AppResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Internal(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(AppError::Internal(format!("failed to encode document: {}", e))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> AppResult<T> {
    serde_json::from_value(Value::Object(doc))
        .map_err(|e| AppError::Internal(format!("failed to decode document: {}", e)))
}

/// Builds a partial document from a `json!` object literal.
pub fn patch(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
