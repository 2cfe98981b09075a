//! The object-document mapper.
//!
//! A [`Mapper`] performs create, read, update, delete, list and search operations
//! for any [`Record`] type against a [`StoreBackend`]. Each operation is a single
//! round trip: check the caller's input, serialize the record to JSON, turn that
//! JSON into a native document, hand it to the backend, and deserialize whatever
//! comes back into a record of the same type.
//!
//! # Example
//!
//! ```ignore
//! use jsonodm::{prelude::*, memory::InMemoryStore};
//!
//! let mapper = Mapper::new(InMemoryStore::new());
//!
//! let mut user = User { id: None, name: Some("Ada".into()) };
//! mapper.create(&mut user).await?;
//!
//! let stored = mapper.read(&user).await?;
//! let named_ada = mapper.search(&User { id: None, name: Some("Ada".into()) }).await?;
//! ```

use bson::{Bson, Document, doc};

use crate::{
    backend::StoreBackend,
    document::{Record, resolve_collection},
    error::{DocumentStoreError, DocumentStoreResult},
    extjson,
    id::ObjectId,
    serializer::Serializer,
};

/// Maps [`Record`] types onto collections of a store backend.
///
/// The mapper holds no per-operation state, so a single instance can serve
/// concurrent callers. Driver failures are returned unchanged as
/// [`DocumentStoreError::Store`]; nothing is retried.
#[derive(Debug)]
pub struct Mapper<B: StoreBackend> {
    backend: B,
    serializer: Serializer,
}

impl<B: StoreBackend> Mapper<B> {
    /// Creates a mapper with the default [`Serializer`].
    pub fn new(backend: B) -> Self {
        Self::with_serializer(backend, Serializer::new())
    }

    /// Creates a mapper with a customised [`Serializer`] (e.g. with extra codecs).
    pub fn with_serializer(backend: B, serializer: Serializer) -> Self {
        Self { backend, serializer }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Consumes the mapper, returning its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Creates a record.
    ///
    /// On return the store-assigned identifier has been written into `record`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the type declares no collection, and
    /// [`DocumentStoreError::InvalidDocument`] if the store reports an `_id` that is
    /// not an object identifier. The insert is not undone in that case.
    pub async fn create<R: Record>(&self, record: &mut R) -> DocumentStoreResult<()> {
        let collection = resolve_collection::<R>()?;
        let document = self.to_document(record)?;

        tracing::debug!(collection, "creating record");

        let inserted = self
            .backend
            .insert_document(collection, document)
            .await?;

        match inserted {
            Bson::ObjectId(id) => {
                record.set_id(Some(ObjectId::from(id)));
                Ok(())
            }
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "store assigned a non-ObjectId _id {other} in collection {collection}"
            ))),
        }
    }

    /// Reads the stored version of a record, located by its identifier only.
    ///
    /// # Returns
    ///
    /// A new record of the same type, or `None` if no document has that identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CallerInput`] if the identifier is not set.
    pub async fn read<R: Record>(&self, record: &R) -> DocumentStoreResult<Option<R>> {
        let filter = id_filter(record)?;
        let collection = resolve_collection::<R>()?;

        tracing::debug!(collection, "reading record");

        self.backend
            .find_document(collection, filter)
            .await?
            .map(|document| self.to_record(&document))
            .transpose()
    }

    /// Replaces the stored document that has the record's identifier with the
    /// whole serialized record.
    ///
    /// # Returns
    ///
    /// The stored document as it was before the update, or `None` if no document
    /// had that identifier (nothing is written then).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CallerInput`] if the identifier is not set.
    pub async fn update<R: Record>(&self, record: &R) -> DocumentStoreResult<Option<Document>> {
        let filter = id_filter(record)?;
        let collection = resolve_collection::<R>()?;
        let replacement = self.to_document(record)?;

        tracing::debug!(collection, "updating record");

        self.backend
            .find_and_replace(collection, filter, replacement)
            .await
    }

    /// Deletes the stored document that has the record's identifier.
    ///
    /// # Returns
    ///
    /// `true` if a document was removed, `false` if none had that identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CallerInput`] if the identifier is not set.
    pub async fn delete<R: Record>(&self, record: &R) -> DocumentStoreResult<bool> {
        let filter = id_filter(record)?;
        let collection = resolve_collection::<R>()?;

        tracing::debug!(collection, "deleting record");

        Ok(self
            .backend
            .find_and_remove(collection, filter)
            .await?
            .is_some())
    }

    /// Lists every record of type `R`, in the store's natural order.
    pub async fn list<R: Record>(&self) -> DocumentStoreResult<Vec<R>> {
        let collection = resolve_collection::<R>()?;

        tracing::debug!(collection, "listing records");

        self.find(collection, Document::new()).await
    }

    /// Lists records that match `criteria` field by field.
    ///
    /// Every field set on `criteria` becomes an equality constraint; fields left
    /// unset (`None`) are not constrained.
    pub async fn search<R: Record>(&self, criteria: &R) -> DocumentStoreResult<Vec<R>> {
        let collection = resolve_collection::<R>()?;
        let filter = self.to_document(criteria)?;

        tracing::debug!(collection, constraints = filter.len(), "searching records");

        self.find(collection, filter).await
    }

    async fn find<R: Record>(&self, collection: &str, filter: Document) -> DocumentStoreResult<Vec<R>> {
        self.backend
            .find_documents(collection, filter)
            .await?
            .iter()
            .map(|document| self.to_record(document))
            .collect()
    }

    fn to_document<R: Record>(&self, record: &R) -> DocumentStoreResult<Document> {
        extjson::parse_document(&self.serializer.serialize(record)?)
    }

    fn to_record<R: Record>(&self, document: &Document) -> DocumentStoreResult<R> {
        self.serializer
            .deserialize(&extjson::to_json_string(document)?)
    }
}

fn id_filter<R: Record>(record: &R) -> DocumentStoreResult<Document> {
    match record.id() {
        Some(id) => Ok(doc! { "_id": *id }),
        None => Err(DocumentStoreError::CallerInput(
            "The document ID has not been set.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::codec;

    #[derive(Debug, Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StoreBackend for CountingBackend {
        async fn insert_document(&self, _collection: &str, _document: Document) -> DocumentStoreResult<Bson> {
            self.touch();
            Ok(Bson::String("not-an-object-id".into()))
        }

        async fn find_document(&self, _collection: &str, _filter: Document) -> DocumentStoreResult<Option<Document>> {
            self.touch();
            Ok(None)
        }

        async fn find_and_replace(
            &self,
            _collection: &str,
            _filter: Document,
            _replacement: Document,
        ) -> DocumentStoreResult<Option<Document>> {
            self.touch();
            Ok(None)
        }

        async fn find_and_remove(&self, _collection: &str, _filter: Document) -> DocumentStoreResult<Option<Document>> {
            self.touch();
            Ok(None)
        }

        async fn find_documents(&self, _collection: &str, _filter: Document) -> DocumentStoreResult<Vec<Document>> {
            self.touch();
            Ok(vec![])
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Note {
        #[serde(rename = "_id", default, with = "codec::nullable")]
        id: Option<ObjectId>,
        text: Option<String>,
    }

    impl Record for Note {
        fn id(&self) -> Option<&ObjectId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: Option<ObjectId>) {
            self.id = id;
        }

        fn collection_name() -> Option<&'static str> {
            Some("notes")
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Undeclared {
        #[serde(rename = "_id", default, with = "codec::nullable")]
        id: Option<ObjectId>,
    }

    impl Record for Undeclared {
        fn id(&self) -> Option<&ObjectId> {
            self.id.as_ref()
        }

        fn set_id(&mut self, id: Option<ObjectId>) {
            self.id = id;
        }
    }

    #[tokio::test]
    async fn missing_id_fails_before_contacting_the_store() {
        let mapper = Mapper::new(CountingBackend::default());
        let note = Note::default();

        assert!(matches!(mapper.read(&note).await, Err(DocumentStoreError::CallerInput(_))));
        assert!(matches!(mapper.update(&note).await, Err(DocumentStoreError::CallerInput(_))));
        assert!(matches!(mapper.delete(&note).await, Err(DocumentStoreError::CallerInput(_))));
        assert_eq!(mapper.backend().calls(), 0);
    }

    #[tokio::test]
    async fn undeclared_collection_fails_before_contacting_the_store() {
        let mapper = Mapper::new(CountingBackend::default());
        let mut record = Undeclared {
            id: Some(ObjectId::new()),
        };

        for result in [
            mapper.create(&mut record).await.map(|_| ()),
            mapper.read(&record).await.map(|_| ()),
            mapper.update(&record).await.map(|_| ()),
            mapper.delete(&record).await.map(|_| ()),
            mapper.list::<Undeclared>().await.map(|_| ()),
            mapper.search(&record).await.map(|_| ()),
        ] {
            match result {
                Err(DocumentStoreError::Configuration(message)) => assert!(message.contains("Undeclared")),
                other => panic!("unexpected result: {other:?}"),
            }
        }

        assert_eq!(mapper.backend().calls(), 0);
    }

    #[tokio::test]
    async fn non_object_id_from_store_is_reported() {
        let mapper = Mapper::new(CountingBackend::default());
        let mut note = Note::default();

        assert!(matches!(
            mapper.create(&mut note).await,
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert_eq!(note.id, None);
        assert_eq!(mapper.backend().calls(), 1);
    }

    #[tokio::test]
    async fn absent_document_reads_as_none() {
        let mapper = Mapper::new(CountingBackend::default());
        let note = Note {
            id: Some(ObjectId::new()),
            text: None,
        };

        assert!(mapper.read(&note).await.unwrap().is_none());
        assert!(mapper.update(&note).await.unwrap().is_none());
        assert!(!mapper.delete(&note).await.unwrap());
        assert_eq!(mapper.backend().calls(), 3);
    }
}
