//! Convenient re-exports of commonly used types from jsonodm.
//!
//! ```ignore
//! use jsonodm::prelude::*;
//! ```
//!
//! This provides access to:
//! - The `Record` trait and its derive macro
//! - Identifier and temporal value types
//! - The mapper, serializer and backend traits
//! - Error types

pub use jsonodm_macros::Record;
pub use jsonodm_core::{
    document::Record,
    id::ObjectId,
    codec::{Codec, CodecTarget, Date, ParseFailurePolicy, Timestamp},
    serializer::{Serializer, SerializerBuilder},
    mapper::Mapper,
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
};
