//! Error types and result types for mapper, serializer and store operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use std::error::Error as StdError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Boxed error raised by a store driver, kept exactly as the driver produced it.
pub type DriverError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors that can occur when mapping records to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The caller passed a value that does not satisfy an operation's precondition,
    /// such as a record whose identifier has not been set.
    ///
    /// Always raised before the store is contacted.
    #[error("Invalid input: {0}")]
    CallerInput(String),
    /// Static configuration is missing or wrong: a record type without a declared
    /// collection, or a connection URI without a database name.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A textual value could not be turned into its typed form (e.g. a malformed
    /// 24-character identifier).
    #[error("Format error: {0}")]
    Format(String),
    /// Serialization/deserialization error when converting between records, JSON and BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The document has an invalid structure (e.g. JSON that is not an object).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// An error surfaced by the underlying store driver. The driver's error is
    /// available untouched through [`std::error::Error::source`] or by matching.
    #[error("Store driver error: {0}")]
    Store(#[source] DriverError),
}

impl DocumentStoreError {
    /// Wraps a driver error without reinterpreting it.
    pub fn store<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        DocumentStoreError::Store(Box::new(err))
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
