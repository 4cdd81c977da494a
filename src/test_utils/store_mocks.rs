//! In-memory implementation of the document store port.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::document_store::{
        Document, DocumentStore, Filter, StoredDocument, from_document, to_document,
    },
    domain::entities::{
        collection::Collection, subscription_record::SubscriptionRecord, user_record::UserRecord,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Set,
    Update,
}

/// One mutation observed by the store, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub kind: WriteKind,
    pub collection: Collection,
    pub id: String,
    pub data: Document,
}

/// In-memory implementation of DocumentStore for testing.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    pub collections: Mutex<HashMap<Collection, BTreeMap<String, Document>>>,
    pub writes: Mutex<Vec<Write>>,
    fail_queries: AtomicBool,
    pages_read: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document directly, bypassing the write log.
    pub fn seed(&self, collection: Collection, id: &str, doc: Document) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection)
            .or_default()
            .insert(id.to_string(), doc);
    }

    pub fn seed_user(&self, id: &str, user: &UserRecord) {
        self.seed(Collection::Users, id, to_document(user).unwrap());
    }

    pub fn seed_subscription(&self, id: &str, record: &SubscriptionRecord) {
        self.seed(Collection::PremiumUsers, id, to_document(record).unwrap());
    }

    pub fn document(&self, collection: Collection, id: &str) -> Option<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn user(&self, id: &str) -> Option<UserRecord> {
        self.document(Collection::Users, id)
            .map(|doc| from_document(doc).unwrap())
    }

    pub fn subscriptions(&self) -> Vec<(String, SubscriptionRecord)> {
        self.collections
            .lock()
            .unwrap()
            .get(&Collection::PremiumUsers)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), from_document(doc.clone()).unwrap()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    /// Makes every subsequent `query` fail with a database error.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// How many `page` calls have been served.
    pub fn pages_read(&self) -> usize {
        self.pages_read.load(Ordering::SeqCst)
    }

    fn record(&self, kind: WriteKind, collection: Collection, id: &str, data: &Document) {
        self.writes.lock().unwrap().push(Write {
            kind,
            collection,
            id: id.to_string(),
            data: data.clone(),
        });
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Document>> {
        Ok(self.document(collection, id))
    }

    async fn set(&self, collection: Collection, id: &str, doc: Document) -> AppResult<()> {
        self.record(WriteKind::Set, collection, id, &doc);
        self.seed(collection, id, doc);
        Ok(())
    }

    async fn update(&self, collection: Collection, id: &str, patch: Document) -> AppResult<()> {
        let mut collections = self.collections.lock().unwrap();
        let existing = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(AppError::NotFound)?;
        for (field, value) in patch.clone() {
            existing.insert(field, value);
        }
        drop(collections);
        self.record(WriteKind::Update, collection, id, &patch);
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> AppResult<Vec<StoredDocument>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Database("Database operation failed".into()));
        }
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filters.iter().all(|f| f.matches(doc)))
                    .map(|(id, doc)| StoredDocument {
                        id: id.clone(),
                        data: doc.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn page(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<StoredDocument>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Database("Database operation failed".into()));
        }
        self.pages_read.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, _)| after.is_none_or(|after| id.as_str() > after))
                    .take(limit)
                    .map(|(id, doc)| StoredDocument {
                        id: id.clone(),
                        data: doc.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::document_store::patch;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_merges_top_level_fields() {
        let store = InMemoryDocumentStore::new();
        store.seed(Collection::Users, "u1", patch(json!({ "a": 1, "b": 2 })));

        store
            .update(Collection::Users, "u1", patch(json!({ "b": 3, "c": 4 })))
            .await
            .unwrap();

        let doc = store.document(Collection::Users, "u1").unwrap();
        assert_eq!(doc, patch(json!({ "a": 1, "b": 3, "c": 4 })));
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update(Collection::Users, "ghost", patch(json!({ "a": 1 })))
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_query_applies_all_filters() {
        let store = InMemoryDocumentStore::new();
        store.seed(
            Collection::PremiumUsers,
            "p1",
            patch(json!({ "email": "a@b.com", "active": true })),
        );
        store.seed(
            Collection::PremiumUsers,
            "p2",
            patch(json!({ "email": "a@b.com", "active": false })),
        );

        let found = store
            .query(
                Collection::PremiumUsers,
                &[Filter::eq_ignore_case("email", "A@B.COM"), Filter::eq("active", true)],
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p1");
    }

    #[tokio::test]
    async fn test_page_walks_ids_in_order() {
        let store = InMemoryDocumentStore::new();
        for id in ["c", "a", "b"] {
            store.seed(Collection::Users, id, patch(json!({ "username": id })));
        }

        let first = store.page(Collection::Users, None, 2).await.unwrap();
        let second = store.page(Collection::Users, Some("b"), 2).await.unwrap();

        let ids = |docs: &[StoredDocument]| docs.iter().map(|d| d.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(ids(&second), vec!["c"]);
        assert_eq!(store.pages_read(), 2);
    }
}
