//! The process-wide MongoDB client.
//!
//! One client is created lazily, from the first URI asked for, and reused by every
//! later request in the process. It is never shut down.

use std::sync::{Arc, LazyLock};

use mongodb::{Client, Database, options::ClientOptions};
use jsonodm_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    handle::SharedCell,
};

use crate::store::MongoDbStore;

static SHARED_CLIENT: LazyLock<SharedCell<Client>> = LazyLock::new(SharedCell::new);

pub(crate) async fn shared_client(options: ClientOptions) -> DocumentStoreResult<Arc<Client>> {
    SHARED_CLIENT
        .get_or_try_init(|| async move {
            tracing::debug!(hosts = ?options.hosts, "creating shared MongoDB client");

            Client::with_options(options).map_err(DocumentStoreError::store)
        })
        .await
}

/// Returns the database named in `uri`, on the process-wide client.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] if `uri` names no database. The
/// check happens before any client is created.
pub async fn shared_database(uri: &str) -> DocumentStoreResult<Database> {
    Ok(MongoDbStore::shared(uri).await?.database().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Other tests in this binary may have created the client already, so this
    // only shows that concurrent callers end up on one client. Racing first-time
    // initialization is covered by `SharedCell`'s own tests in jsonodm-core.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_client() {
        let tasks = (0..8)
            .map(|n| tokio::spawn(async move {
                MongoDbStore::shared(&format!("mongodb://localhost:27017/db{n}"))
                    .await
                    .unwrap()
            }))
            .collect::<Vec<_>>();

        let mut stores = Vec::new();
        for task in tasks {
            stores.push(task.await.unwrap());
        }

        assert!(stores.windows(2).all(|pair| Arc::ptr_eq(pair[0].client(), pair[1].client())));
        assert_eq!(stores[3].database().name(), "db3");
    }

    #[tokio::test]
    async fn shared_database_selects_the_named_database() {
        let database = shared_database("mongodb://localhost:27017/reports").await.unwrap();

        assert_eq!(database.name(), "reports");
    }

    #[tokio::test]
    async fn shared_database_requires_a_name() {
        match shared_database("mongodb://localhost:27017/").await {
            Err(DocumentStoreError::Configuration(message)) => assert!(message.contains("localhost:27017")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
