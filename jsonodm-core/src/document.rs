//! The record trait and collection-name resolution.
//!
//! Every type persisted through the [`Mapper`](crate::mapper::Mapper) implements
//! [`Record`]: it exposes a settable identifier and declares, at compile time,
//! which collection it lives in.

use std::any::type_name;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    id::ObjectId,
};

/// Core trait that all records stored through the mapper must implement.
///
/// The identifier is absent until the record has been created in the store, at
/// which point the store-assigned value is written back with [`Record::set_id`].
/// On the wire the identifier lives under the `_id` key.
///
/// # Deriving with `#[derive(Record)]`
///
/// ```ignore
/// use jsonodm::prelude::*;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
/// #[record(collection = "users")]
/// pub struct User {
///     #[record(id)]
///     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
///     pub id: Option<ObjectId>,
///     pub name: Option<String>,
/// }
/// ```
///
/// Written by hand the same declaration is:
///
/// ```ignore
/// impl Record for User {
///     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
///     fn set_id(&mut self, id: Option<ObjectId>) { self.id = id; }
///     fn collection_name() -> Option<&'static str> { Some("users") }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the identifier, if one has been assigned.
    fn id(&self) -> Option<&ObjectId>;

    /// Replaces the identifier.
    fn set_id(&mut self, id: Option<ObjectId>);

    /// The declared collection name.
    ///
    /// `None` means no collection was declared and mapper operations on this type
    /// fail with a configuration error. A blank name falls back to the type's bare name.
    fn collection_name() -> Option<&'static str> {
        None
    }
}

/// Resolves the collection a record type is stored in.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] naming the type if it declares no collection.
pub fn resolve_collection<R: Record>() -> DocumentStoreResult<&'static str> {
    match R::collection_name() {
        Some(name) if !name.trim().is_empty() => Ok(name),
        Some(_) => Ok(simple_type_name::<R>()),
        None => Err(DocumentStoreError::Configuration(format!(
            "{} does not declare a collection. Are you sure this is right?",
            simple_type_name::<R>()
        ))),
    }
}

/// The bare name of a type, without module path or generic arguments.
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);

    base.rsplit("::").next().unwrap_or(base)
}
