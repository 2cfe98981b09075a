//! JSON serialization of records with a per-type codec registry.
//!
//! The [`Serializer`] turns any `Serialize` value into JSON text and back, routing
//! identifier, timestamp and date values through the codecs of its
//! [`CodecRegistry`]. Caller-supplied codecs are consulted before the built-in
//! [`IdentifierCodec`], [`TemporalCodec`] and [`DateCodec`].
//!
//! Members whose value is null are left out of serialized objects, so unset
//! optional fields (including an unassigned identifier) do not appear on the wire.
//!
//! # Example
//!
//! ```ignore
//! use jsonodm::{codec::ParseFailurePolicy, serializer::Serializer};
//!
//! let serializer = Serializer::builder()
//!     .codec::<Money>(MoneyCodec)
//!     .temporal_policy(ParseFailurePolicy::Fail)
//!     .build();
//!
//! let json = serializer.serialize(&order)?;
//! let order: Order = serializer.deserialize(&json)?;
//! ```

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    codec::{
        Codec, CodecRegistry, Date, DateCodec, IdentifierCodec, ParseFailurePolicy, TemporalCodec,
        Timestamp, with_registry,
    },
    error::{DocumentStoreError, DocumentStoreResult},
    id::ObjectId,
};

/// Converts values to and from JSON using a fixed codec registry.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Serializer {
    registry: Arc<CodecRegistry>,
}

impl Serializer {
    /// Creates a serializer with only the built-in codecs.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a serializer with the built-in codecs plus one caller-supplied codec.
    pub fn with_codec<T: 'static>(codec: impl Codec<T> + 'static) -> Self {
        Self::builder().codec::<T>(codec).build()
    }

    pub fn builder() -> SerializerBuilder {
        SerializerBuilder::default()
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Serializes `value` to JSON text.
    ///
    /// # Errors
    ///
    /// Returns the codec's own error if a codec fails, otherwise a
    /// [`Serialization`](DocumentStoreError::Serialization) error.
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> DocumentStoreResult<String> {
        Ok(serde_json::to_string(&self.to_value(value)?)?)
    }

    /// Serializes `value` to a JSON value, with null object members removed.
    pub fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> DocumentStoreResult<Value> {
        let mut value = self.scoped(|| serde_json::to_value(value))?;
        strip_nulls(&mut value);

        Ok(value)
    }

    /// Deserializes JSON text into a new `T`.
    ///
    /// # Errors
    ///
    /// Returns the codec's own error if a codec fails (for example
    /// [`Format`](DocumentStoreError::Format) for a malformed identifier), otherwise a
    /// [`Serialization`](DocumentStoreError::Serialization) error.
    pub fn deserialize<T: DeserializeOwned>(&self, json: &str) -> DocumentStoreResult<T> {
        self.scoped(|| serde_json::from_str(json))
    }

    /// Deserializes a JSON value into a new `T`.
    pub fn from_value<T: DeserializeOwned>(&self, value: Value) -> DocumentStoreResult<T> {
        self.scoped(|| serde_json::from_value(value))
    }

    fn scoped<R>(&self, f: impl FnOnce() -> serde_json::Result<R>) -> DocumentStoreResult<R> {
        match with_registry(&self.registry, f) {
            (Ok(value), _) => Ok(value),
            // serde carries the codec's message, plus a position when parsing text
            (Err(e), Some(codec_error)) if e.to_string().contains(&codec_error.to_string()) => {
                Err(codec_error)
            },
            (Err(e), _) => Err(DocumentStoreError::from(e)),
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Serializer`] instances.
#[derive(Debug, Default)]
pub struct SerializerBuilder {
    registry: CodecRegistry,
    temporal_policy: ParseFailurePolicy,
}

impl SerializerBuilder {
    /// Registers a caller-supplied codec for `T`. It takes precedence over any
    /// built-in codec for the same type.
    pub fn codec<T: 'static>(mut self, codec: impl Codec<T> + 'static) -> Self {
        self.registry.register::<T>(codec);
        self
    }

    /// Chooses how the built-in timestamp codec treats unparseable text.
    pub fn temporal_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.temporal_policy = policy;
        self
    }

    pub fn build(self) -> Serializer {
        let mut registry = self.registry;

        registry.register_builtin::<ObjectId>(IdentifierCodec);
        registry.register_builtin::<Timestamp>(TemporalCodec::new(self.temporal_policy));
        registry.register_builtin::<Date>(DateCodec);

        Serializer {
            registry: Arc::new(registry),
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, member| !member.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::codec;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Visit {
        #[serde(rename = "_id", default, with = "codec::nullable")]
        id: Option<ObjectId>,
        page: String,
        #[serde(default, with = "codec::nullable")]
        at: Option<Timestamp>,
        day: Option<Date>,
        tags: Vec<Option<String>>,
    }

    fn day() -> Date {
        Date::new(
            NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(14, 22, 5)
                .unwrap(),
        )
    }

    struct Wibble;

    impl Codec<ObjectId> for Wibble {
        fn encode(&self, _value: &ObjectId) -> DocumentStoreResult<Value> {
            Ok(json!("wibble"))
        }

        fn decode(&self, value: &Value) -> DocumentStoreResult<Option<ObjectId>> {
            match value.as_str() {
                Some("wibble") => Ok(Some(ObjectId::parse_str("507f1f77bcf86cd799439011")?)),
                _ => Ok(None),
            }
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    #[allow(dead_code)]
    enum Reference {
        Id(ObjectId),
        Raw(Value),
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Link {
        target: Reference,
        weight: u32,
    }

    #[test]
    fn recovered_codec_error_is_not_reported() {
        let serializer = Serializer::new();

        let link: Link = serializer
            .from_value(json!({ "target": { "$oid": "nope" }, "weight": 1 }))
            .unwrap();
        assert!(matches!(link.target, Reference::Raw(_)));

        assert!(matches!(
            serializer.from_value::<Link>(json!({ "target": { "$oid": "nope" }, "weight": "heavy" })),
            Err(DocumentStoreError::Serialization(_))
        ));
    }

    #[test]
    fn serializes_a_bare_identifier() {
        let serializer = Serializer::new();
        let id = ObjectId::new();

        let json = serializer.serialize(&id).unwrap();
        let recovered: ObjectId = serializer.deserialize(&json).unwrap();

        assert_eq!(json, format!(r#"{{"$oid":"{}"}}"#, id.to_hex()));
        assert_eq!(recovered, id);
    }

    #[test]
    fn caller_codec_overrides_identifier_codec() {
        let serializer = Serializer::with_codec::<ObjectId>(Wibble);

        assert_eq!(serializer.serialize(&ObjectId::new()).unwrap(), r#""wibble""#);
    }

    #[test]
    fn omits_null_members_but_keeps_null_array_items() {
        let visit = Visit {
            id: None,
            page: "/home".to_string(),
            at: None,
            day: None,
            tags: vec![None, Some("new".to_string())],
        };

        assert_eq!(
            Serializer::new().to_value(&visit).unwrap(),
            json!({ "page": "/home", "tags": [null, "new"] })
        );
    }

    #[test]
    fn round_trips_a_record() {
        let serializer = Serializer::new();
        let visit = Visit {
            id: Some(ObjectId::new()),
            page: "/about".to_string(),
            at: Some(Timestamp::now()),
            day: Some(day()),
            tags: vec![],
        };

        let json = serializer.serialize(&visit).unwrap();

        assert!(json.contains(r#""day":"June 01, 2023 14:22:05""#));
        assert_eq!(serializer.deserialize::<Visit>(&json).unwrap(), visit);
    }

    #[test]
    fn unparseable_timestamp_becomes_none() {
        let visit: Visit = Serializer::new()
            .from_value(json!({ "page": "/", "at": "last tuesday", "tags": [] }))
            .unwrap();

        assert_eq!(visit.at, None);
    }

    #[test]
    fn strict_policy_reports_format_error() {
        let serializer = Serializer::builder()
            .temporal_policy(ParseFailurePolicy::Fail)
            .build();

        let result = serializer.from_value::<Visit>(json!({ "page": "/", "at": "last tuesday", "tags": [] }));

        assert!(matches!(result, Err(DocumentStoreError::Format(_))));
    }

    #[test]
    fn malformed_identifier_reports_format_error() {
        let result = Serializer::new().deserialize::<Visit>(
            r#"{"_id":{"$oid":"zzzz1f77bcf86cd799439011"},"page":"/","tags":[]}"#,
        );

        assert!(matches!(result, Err(DocumentStoreError::Format(_))));
    }

    #[test]
    fn structural_errors_are_serialization_errors() {
        let result = Serializer::new().deserialize::<Visit>(r#"{"tags":[]}"#);

        assert!(matches!(result, Err(DocumentStoreError::Serialization(_))));
    }
}
