//! In-memory storage implementation for the mapper.
//!
//! This module provides a simple backend that keeps each collection as an
//! insertion-ordered list of BSON documents behind an async-safe read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, oid::ObjectId};

use jsonodm_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    backend::{StoreBackend, StoreBackendBuilder},
};

use crate::evaluator::DocumentEvaluator;

type StoreMap = HashMap<String, Vec<Document>>;


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait with the same observable
/// behaviour as a document store: `_id` values are assigned on insert and must be
/// unique per collection, find-and-modify operations act on the first match
/// atomically, and listing returns documents in insertion order.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use jsonodm_memory::InMemoryStore;
/// use jsonodm::backend::StoreBackend;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let id = store.insert_document("users", doc! { "name": "Alice" }).await?;
///     let found = store.find_document("users", doc! { "_id": id }).await?;
///     assert!(found.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn with_leading_id(id: Bson, document: Document) -> Document {
    Document::from_iter(
        std::iter::once(("_id".to_string(), id))
            .chain(document.into_iter().filter(|(k, _)| k != "_id"))
    )
}

fn position(documents: &[Document], filter: &Document) -> Option<usize> {
    documents
        .iter()
        .position(|doc| DocumentEvaluator::new(doc).matches(filter))
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        let (id, document) = match document.get("_id").cloned() {
            Some(id) => (id, document),
            None => {
                // _id leads the document, as a store driver would place it
                let id = Bson::ObjectId(ObjectId::new());
                (id.clone(), with_leading_id(id, document))
            }
        };

        if documents.iter().any(|doc| doc.get("_id") == Some(&id)) {
            return Err(DocumentStoreError::DocumentAlreadyExists(id.to_string(), collection.to_string()));
        }

        documents.push(document);

        Ok(id)
    }

    async fn find_document(&self, collection: &str, filter: Document) -> DocumentStoreResult<Option<Document>> {
        let store = self.store.read().await;

        Ok(
            store
                .get(collection)
                .and_then(|documents| {
                    documents
                        .iter()
                        .find(|doc| DocumentEvaluator::new(doc).matches(&filter))
                })
                .cloned()
        )
    }

    async fn find_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(None),
        };

        let Some(index) = position(documents, &filter) else {
            return Ok(None);
        };

        let previous = &documents[index];
        let id = previous.get("_id").cloned().unwrap_or(Bson::Null);

        if let Some(new_id) = replacement.get("_id") {
            if new_id != &id {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "replacement would change _id from {id} to {new_id} in collection {collection}"
                )));
            }
        }

        let stored = with_leading_id(id, replacement);

        Ok(Some(std::mem::replace(&mut documents[index], stored)))
    }

    async fn find_and_remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(None),
        };

        Ok(position(documents, &filter).map(|index| documents.remove(index)))
    }

    async fn find_documents(&self, collection: &str, filter: Document) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(
            documents
                .iter()
                .filter(|doc| DocumentEvaluator::new(doc).matches(&filter))
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use jsonodm_memory::InMemoryStore;
/// use jsonodm::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        tracing::debug!("building in-memory store");

        Ok(InMemoryStore::new())
    }
}
