use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection, Database,
    options::ClientOptions,
};
use jsonodm_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::handle::shared_client;


/// A [`StoreBackend`] over one MongoDB database.
///
/// The store either owns its client ([`MongoDbStore::builder`]) or borrows the
/// process-wide one ([`MongoDbStore::shared`]). Only an owned client is closed by
/// [`StoreBackend::shutdown`].
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Arc<Client>,
    database: Database,
    shared: bool,
}

impl MongoDbStore {
    /// Wraps an existing client, owning it.
    pub fn new(client: Client, database: &str) -> Self {
        Self {
            database: client.database(database),
            client: Arc::new(client),
            shared: false,
        }
    }

    pub fn builder(uri: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(uri)
    }

    /// Returns a store over the database named in `uri`, using the process-wide client.
    ///
    /// The first call creates the client from its URI; every later call, whatever
    /// its URI, reuses that same client and only selects the database.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if `uri` names no database.
    pub async fn shared(uri: &str) -> DocumentStoreResult<Self> {
        let (options, database) = connection_options(uri).await?;
        let client = shared_client(options).await?;

        Ok(Self {
            database: client.database(&database),
            client,
            shared: true,
        })
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.database.collection(collection_name)
    }
}

/// Parses a connection string and extracts the database it names.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] mentioning `uri` when the database
/// name is missing or blank, and [`DocumentStoreError::Store`] when the driver
/// rejects the connection string.
pub(crate) async fn connection_options(uri: &str) -> DocumentStoreResult<(ClientOptions, String)> {
    let options = ClientOptions::parse(uri)
        .await
        .map_err(DocumentStoreError::store)?;

    match options.default_database.clone() {
        Some(database) if !database.trim().is_empty() => Ok((options, database)),
        _ => Err(DocumentStoreError::Configuration(format!(
            "Could not determine the database name from URI {uri}."
        ))),
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, collection: &str, document: Document) -> DocumentStoreResult<Bson> {
        Ok(
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map_err(DocumentStoreError::store)?
                .inserted_id
        )
    }

    async fn find_document(&self, collection: &str, filter: Document) -> DocumentStoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(filter)
            .await
            .map_err(DocumentStoreError::store)
    }

    async fn find_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> DocumentStoreResult<Option<Document>> {
        // The driver returns the pre-image unless told otherwise.
        self.get_collection(collection)
            .find_one_and_replace(filter, replacement)
            .await
            .map_err(DocumentStoreError::store)
    }

    async fn find_and_remove(&self, collection: &str, filter: Document) -> DocumentStoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one_and_delete(filter)
            .await
            .map_err(DocumentStoreError::store)
    }

    async fn find_documents(&self, collection: &str, filter: Document) -> DocumentStoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(filter)
            .await
            .map_err(DocumentStoreError::store)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(DocumentStoreError::store)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        if self.shared {
            return Ok(());
        }

        // Clones of this store keep the client open until the last one shuts down.
        if let Ok(client) = Arc::try_unwrap(self.client) {
            tracing::debug!(database = self.database.name(), "shutting down MongoDB client");
            client.shutdown().await;
        }

        Ok(())
    }
}

/// Builds a [`MongoDbStore`] that owns a new client.
///
/// # Example
///
/// ```ignore
/// use jsonodm::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
///
/// let store = MongoDbStore::builder("mongodb://localhost:27017/my_database")
///     .build()
///     .await?;
/// ```
pub struct MongoDbStoreBuilder {
    uri: String,
}

impl MongoDbStoreBuilder {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let (options, database) = connection_options(&self.uri).await?;

        tracing::debug!(database = %database, "building MongoDB store");

        Ok(MongoDbStore::new(
            Client::with_options(options).map_err(DocumentStoreError::store)?,
            &database,
        ))
    }
}
