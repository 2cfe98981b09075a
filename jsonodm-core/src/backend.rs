//! Storage backend abstraction for the mapper.
//!
//! This module defines the traits that abstract over document store drivers, so
//! the [`Mapper`](crate::mapper::Mapper) can work against MongoDB or an in-process
//! store alike.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait is the single seam between the mapper and a driver.
//! Every method is one request/response round trip against one collection, using
//! the store's native document type ([`bson::Document`]). Filters are plain
//! field-equality documents such as `{"_id": ObjectId(..)}`.
//!
//! # Examples
//!
//! ```ignore
//! use jsonodm::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = backend.insert_document("users", doc! { "name": "Alice" }).await?;
//! let found = backend.find_document("users", doc! { "_id": id }).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::error::DocumentStoreResult;

/// Abstract interface for document store drivers.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks.
///
/// # Error Handling
///
/// Failures raised by the driver itself (connectivity, timeouts, rejected queries)
/// are returned as [`DocumentStoreError::Store`](crate::error::DocumentStoreError::Store)
/// carrying the driver's own error, without interpretation.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts one document into a collection.
    ///
    /// If the document has no `_id`, the backend assigns a fresh object identifier.
    ///
    /// # Returns
    ///
    /// The `_id` of the stored document.
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson>;

    /// Returns the first document matching `filter`, if any.
    async fn find_document(
        &self,
        collection: &str,
        filter: Document,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Atomically replaces the first document matching `filter` with `replacement`.
    ///
    /// # Returns
    ///
    /// The document as it was before the replacement, or `None` if nothing matched
    /// (in which case nothing is written).
    async fn find_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Atomically removes the first document matching `filter`.
    ///
    /// # Returns
    ///
    /// The removed document, or `None` if nothing matched.
    async fn find_and_remove(
        &self,
        collection: &str,
        filter: Document,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Returns every document matching `filter`, in the store's natural order.
    ///
    /// An empty filter matches every document in the collection.
    async fn find_documents(&self, collection: &str, filter: Document) -> DocumentStoreResult<Vec<Document>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        (*self)
            .insert_document(collection, document)
            .await
    }

    async fn find_document(
        &self,
        collection: &str,
        filter: Document,
    ) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .find_document(collection, filter)
            .await
    }

    async fn find_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .find_and_replace(collection, filter, replacement)
            .await
    }

    async fn find_and_remove(
        &self,
        collection: &str,
        filter: Document,
    ) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .find_and_remove(collection, filter)
            .await
    }

    async fn find_documents(&self, collection: &str, filter: Document) -> DocumentStoreResult<Vec<Document>> {
        (*self)
            .find_documents(collection, filter)
            .await
    }
}

/// Factory trait for creating backend instances asynchronously.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
