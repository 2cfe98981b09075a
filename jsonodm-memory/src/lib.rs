//! In-memory document storage backend for jsonodm.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Native documents** - Stores BSON documents in insertion order, per collection
//! - **Equality filters** - Matches filters the way a document store would
//!
//! # Quick Start
//!
//! ```ignore
//! use jsonodm::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! #[record(collection = "users")]
//! pub struct User {
//!     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
//!     pub id: Option<ObjectId>,
//!     pub name: Option<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let mapper = Mapper::new(backend);
//!
//!     let mut user = User { id: None, name: Some("Alice".to_string()) };
//!     mapper.create(&mut user).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as jsonodm_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
