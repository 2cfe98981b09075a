//! Per-type JSON codecs and the registry that selects them.
//!
//! A [`Codec<T>`] turns a `T` into a JSON [`Value`] and back. Codecs are keyed by
//! the Rust type they handle and collected in a [`CodecRegistry`], which consults
//! caller-supplied entries before the built-in ones. This is how a caller can
//! replace, for example, the wire form of [`ObjectId`](crate::id::ObjectId).
//!
//! Types that take part in codec selection implement [`CodecTarget`] and route
//! their `Serialize`/`Deserialize` impls through [`coded`]. While a
//! [`Serializer`](crate::serializer::Serializer) runs, its registry is the active
//! one for the current thread; outside of it the type's own default codec is used.
//!
//! Optional fields of a codec-aware type should use [`nullable`]:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     #[serde(rename = "_id", default, with = "jsonodm::codec::nullable")]
//!     id: Option<ObjectId>,
//!     #[serde(default, with = "jsonodm::codec::nullable")]
//!     at: Option<Timestamp>,
//! }
//! ```

mod date;
mod identifier;
mod temporal;

use std::{
    any::{Any, TypeId, type_name},
    cell::RefCell,
    collections::HashMap,
    fmt,
    sync::Arc,
};

use serde_json::Value;

use crate::error::{DocumentStoreError, DocumentStoreResult};

pub use date::{DATE_FORMAT, Date, DateCodec};
pub use identifier::IdentifierCodec;
pub use temporal::{ParseFailurePolicy, TIMESTAMP_FORMAT, TemporalCodec, Timestamp};

/// A paired encode/decode function for one value type.
///
/// `decode` may yield `Ok(None)` to signal an absent value. Inside a
/// [`nullable`] field that becomes `None`; for a required field it is an error.
pub trait Codec<T>: Send + Sync {
    /// Encodes a value into its JSON form.
    fn encode(&self, value: &T) -> DocumentStoreResult<Value>;

    /// Decodes a value from its JSON form.
    fn decode(&self, value: &Value) -> DocumentStoreResult<Option<T>>;
}

/// A type whose JSON form is chosen through the codec registry.
pub trait CodecTarget: Sized + Send + Sync + 'static {
    /// The codec used when no registry supplies one.
    fn default_codec() -> Arc<dyn Codec<Self>>;
}

/// Codecs keyed by value type, caller-supplied entries first.
#[derive(Default)]
pub struct CodecRegistry {
    custom: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    builtin: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a caller-supplied codec for `T`, replacing any earlier one.
    pub fn register<T: 'static>(&mut self, codec: impl Codec<T> + 'static) {
        self.custom
            .insert(TypeId::of::<T>(), Box::new(Arc::new(codec) as Arc<dyn Codec<T>>));
    }

    pub(crate) fn register_builtin<T: 'static>(&mut self, codec: impl Codec<T> + 'static) {
        self.builtin
            .insert(TypeId::of::<T>(), Box::new(Arc::new(codec) as Arc<dyn Codec<T>>));
    }

    /// Returns the codec for `T`: the caller-supplied one if present, else the built-in one.
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn Codec<T>>> {
        let key = TypeId::of::<T>();

        self.custom
            .get(&key)
            .or_else(|| self.builtin.get(&key))
            .and_then(|entry| entry.downcast_ref::<Arc<dyn Codec<T>>>())
            .cloned()
    }

    /// Returns `true` if the caller supplied a codec for `T`.
    pub fn has_custom<T: 'static>(&self) -> bool {
        self.custom.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("custom", &self.custom.len())
            .field("builtin", &self.builtin.len())
            .finish()
    }
}

struct Scope {
    registry: Arc<CodecRegistry>,
    error: Option<DocumentStoreError>,
}

thread_local! {
    static SCOPES: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| scopes.borrow_mut().pop());
    }
}

/// Runs `f` with `registry` active on this thread.
///
/// Returns the result of `f` together with the last codec error raised while it
/// ran, so callers can report it instead of serde's stringified copy. Serde may
/// have recovered from that error (an untagged enum trying its next variant), so
/// callers must check it is the one their failure carries.
pub(crate) fn with_registry<R>(
    registry: &Arc<CodecRegistry>,
    f: impl FnOnce() -> R,
) -> (R, Option<DocumentStoreError>) {
    SCOPES.with(|scopes| {
        scopes.borrow_mut().push(Scope {
            registry: Arc::clone(registry),
            error: None,
        })
    });

    let _guard = ScopeGuard;
    let result = f();
    let error = SCOPES.with(|scopes| {
        scopes
            .borrow_mut()
            .last_mut()
            .and_then(|scope| scope.error.take())
    });

    (result, error)
}

fn lookup<T: CodecTarget>() -> Arc<dyn Codec<T>> {
    SCOPES
        .with(|scopes| {
            scopes
                .borrow()
                .last()
                .and_then(|scope| scope.registry.get::<T>())
        })
        .unwrap_or_else(T::default_codec)
}

fn record_error(err: DocumentStoreError) -> String {
    let message = err.to_string();

    SCOPES.with(|scopes| {
        if let Some(scope) = scopes.borrow_mut().last_mut() {
            scope.error = Some(err);
        }
    });

    message
}

/// Serde adapters for required codec-aware values.
pub mod coded {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
    use serde_json::Value;

    use super::{CodecTarget, lookup, record_error, type_name};

    /// Encodes `value` with the active codec for `T`.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CodecTarget,
        S: Serializer,
    {
        lookup::<T>()
            .encode(value)
            .map_err(|e| ser::Error::custom(record_error(e)))?
            .serialize(serializer)
    }

    /// Decodes a `T` with the active codec; an absent result is an error.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: CodecTarget,
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        lookup::<T>()
            .decode(&value)
            .map_err(|e| de::Error::custom(record_error(e)))?
            .ok_or_else(|| de::Error::custom(format!("{} decoded to an absent value", type_name::<T>())))
    }
}

/// Serde adapters for `Option<T>` fields of codec-aware values.
///
/// `None` serializes as null (and is then dropped from objects by the
/// [`Serializer`](crate::serializer::Serializer)); null input and absent
/// decodes deserialize as `None`. Pair with `#[serde(default)]` so a missing
/// key is also `None`.
pub mod nullable {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use serde_json::Value;

    use super::{CodecTarget, coded, lookup, record_error};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CodecTarget,
        S: Serializer,
    {
        match value {
            Some(value) => coded::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: CodecTarget,
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if value.is_null() {
            return Ok(None);
        }

        lookup::<T>()
            .decode(&value)
            .map_err(|e| de::Error::custom(record_error(e)))
    }
}
