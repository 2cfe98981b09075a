//! A small object-document mapper that stores typed records in a document store,
//! using JSON as the intermediate wire format.
//!
//! This crate is the core of the jsonodm project and provides:
//!
//! - **Records** ([`document`]) - The trait every persisted type implements, plus collection-name resolution
//! - **Identifiers** ([`id`]) - The 12-byte object identifier assigned by the store
//! - **Codecs** ([`codec`]) - Per-type JSON encodings for identifiers, timestamps and dates
//! - **Serializer** ([`serializer`]) - JSON (de)serialization with a caller-extensible codec registry
//! - **Extended JSON** ([`extjson`]) - The bridge between JSON text and native BSON documents
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different store drivers
//! - **Mapper** ([`mapper`]) - Create, read, update, delete, list and search for records
//! - **Shared handles** ([`handle`]) - One-time initialization of process-wide clients
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use jsonodm::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
//! #[record(collection = "users")]
//! pub struct User {
//!     #[record(id)]
//!     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
//!     pub id: Option<ObjectId>,
//!     pub name: Option<String>,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as jsonodm_core;

pub mod backend;
pub mod codec;
pub mod document;
pub mod error;
pub mod extjson;
pub mod handle;
pub mod id;
pub mod mapper;
pub mod serializer;
