//! Main jsonodm crate providing a unified interface to the object-document mapper.
//!
//! This crate is the primary entry point for users of jsonodm. It re-exports the
//! core types from the sub-crates, the `Record` derive macro, and the available
//! store backends.
//!
//! # Features
//!
//! - **Typed records** - Define records with Serde and `#[derive(Record)]`
//! - **JSON as the wire format** - Every record passes through JSON on its way to and from the store
//! - **Pluggable codecs** - Override how identifiers, timestamps, dates or your own types are encoded
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use jsonodm::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
//! #[record(collection = "users")]
//! pub struct User {
//!     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
//!     pub id: Option<ObjectId>,
//!     pub name: Option<String>,
//!     #[serde(default, with = "jsonodm::codec::nullable")]
//!     pub joined: Option<Timestamp>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mapper = Mapper::new(InMemoryStore::new());
//!
//!     let mut user = User {
//!         name: Some("Alice".to_string()),
//!         joined: Some(Timestamp::now()),
//!         ..Default::default()
//!     };
//!
//!     // The store-assigned identifier is written back into `user`
//!     mapper.create(&mut user).await?;
//!
//!     let stored = mapper.read(&user).await?;
//!     assert_eq!(stored, Some(user.clone()));
//!
//!     // Search by example: unset fields are not constrained
//!     let alices = mapper
//!         .search(&User { name: Some("Alice".to_string()), ..Default::default() })
//!         .await?;
//!
//!     println!("Found users: {:?}", alices);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom codecs
//!
//! ```ignore
//! use jsonodm::{prelude::*, codec::Codec};
//! use serde_json::{Value, json};
//!
//! struct HexIds;
//!
//! impl Codec<ObjectId> for HexIds {
//!     fn encode(&self, value: &ObjectId) -> DocumentStoreResult<Value> {
//!         Ok(json!({ "$oid": value.to_hex() }))
//!     }
//!
//!     fn decode(&self, value: &Value) -> DocumentStoreResult<Option<ObjectId>> {
//!         value["$oid"].as_str().map(ObjectId::parse_str).transpose()
//!     }
//! }
//!
//! let mapper = Mapper::with_serializer(
//!     InMemoryStore::new(),
//!     Serializer::builder().codec::<ObjectId>(HexIds).build(),
//! );
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use jsonodm_core::{backend, codec, document, error, extjson, handle, id, mapper, serializer};
pub use jsonodm_macros::Record;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use jsonodm_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use jsonodm_mongodb::{MongoDbStore, MongoDbStoreBuilder, shared_database};
}
