use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

use crate::{
    codec::{Codec, CodecTarget, coded},
    error::DocumentStoreResult,
    id::ObjectId,
};

/// Encodes an [`ObjectId`] as `{"$oid": "<24 lowercase hex chars>"}`.
///
/// Decoding reads the `$oid` member; anything without a non-blank `$oid` string
/// decodes to an absent value. A present but malformed hex string is a
/// [`Format`](crate::error::DocumentStoreError::Format) error.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierCodec;

impl Codec<ObjectId> for IdentifierCodec {
    fn encode(&self, value: &ObjectId) -> DocumentStoreResult<Value> {
        Ok(json!({ "$oid": value.to_hex() }))
    }

    fn decode(&self, value: &Value) -> DocumentStoreResult<Option<ObjectId>> {
        match value.get("$oid").and_then(Value::as_str) {
            Some(hex) if !hex.trim().is_empty() => ObjectId::parse_str(hex).map(Some),
            _ => Ok(None),
        }
    }
}

impl CodecTarget for ObjectId {
    fn default_codec() -> Arc<dyn Codec<Self>> {
        Arc::new(IdentifierCodec)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        coded::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        coded::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentStoreError;

    #[test]
    fn encodes_nested_oid() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();

        assert_eq!(
            IdentifierCodec.encode(&id).unwrap(),
            json!({ "$oid": "507f1f77bcf86cd799439011" })
        );
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            r#"{"$oid":"507f1f77bcf86cd799439011"}"#
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let id = ObjectId::new();
        let encoded = IdentifierCodec.encode(&id).unwrap();

        assert_eq!(IdentifierCodec.decode(&encoded).unwrap(), Some(id));
    }

    #[test]
    fn blank_or_missing_oid_is_absent() {
        assert_eq!(IdentifierCodec.decode(&json!({ "$oid": "  " })).unwrap(), None);
        assert_eq!(IdentifierCodec.decode(&json!({})).unwrap(), None);
        assert_eq!(IdentifierCodec.decode(&json!("507f1f77bcf86cd799439011")).unwrap(), None);
    }

    #[test]
    fn malformed_oid_is_a_format_error() {
        assert!(matches!(
            IdentifierCodec.decode(&json!({ "$oid": "507f1f77bcf86cd79943901" })),
            Err(DocumentStoreError::Format(_))
        ));
    }
}
