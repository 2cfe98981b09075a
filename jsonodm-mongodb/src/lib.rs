//! MongoDB backend implementation for jsonodm.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait
//! on top of the official async driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! jsonodm = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Connections are configured with a single connection string that must name the
//! database, e.g. `mongodb://localhost:27017/my_database`. Either build a store
//! that owns its client, or use the process-wide client shared by every caller.
//!
//! # Example
//!
//! ```ignore
//! use jsonodm::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // An owned client
//!     let store = MongoDbStore::builder("mongodb://localhost:27017/my_database")
//!         .build()
//!         .await?;
//!
//!     // The process-wide client
//!     let shared = MongoDbStore::shared("mongodb://localhost:27017/my_database").await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as jsonodm_mongodb;

pub mod handle;
pub mod store;

pub use handle::shared_database;
pub use store::{MongoDbStore, MongoDbStoreBuilder};
