//! The 12-byte document identifier.

use std::{fmt, str::FromStr};

use bson::oid;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A 12-byte globally unique identifier with a canonical 24-character hexadecimal form.
///
/// This is the identifier the document store assigns to a record on creation. Its
/// JSON form is decided by the codec registered for it, by default
/// `{"$oid": "<24 lowercase hex chars>"}` (see [`IdentifierCodec`](crate::codec::IdentifierCodec)).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(oid::ObjectId);

impl ObjectId {
    /// Generates a new identifier.
    pub fn new() -> Self {
        Self(oid::ObjectId::new())
    }

    /// Builds an identifier from its raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(oid::ObjectId::from_bytes(bytes))
    }

    /// Parses the 24-character hexadecimal form.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Format`] if the text is not exactly 24 hex digits.
    pub fn parse_str(text: &str) -> DocumentStoreResult<Self> {
        oid::ObjectId::parse_str(text)
            .map(Self)
            .map_err(|e| DocumentStoreError::Format(format!("invalid object id {text:?}: {e}")))
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> [u8; 12] {
        self.0.bytes()
    }

    /// Returns the lowercase 24-character hexadecimal form.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<oid::ObjectId> for ObjectId {
    fn from(value: oid::ObjectId) -> Self {
        Self(value)
    }
}

impl From<ObjectId> for oid::ObjectId {
    fn from(value: ObjectId) -> Self {
        value.0
    }
}

impl From<ObjectId> for bson::Bson {
    fn from(value: ObjectId) -> Self {
        bson::Bson::ObjectId(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_hex() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();

        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(id, "507f1f77bcf86cd799439011".parse().unwrap());
    }

    #[test]
    fn rejects_malformed_hex() {
        for text in ["", "507f1f77bcf86cd79943901", "507f1f77bcf86cd79943901z", "507f1f77bcf86cd7994390112"] {
            assert!(matches!(
                ObjectId::parse_str(text),
                Err(DocumentStoreError::Format(_))
            ));
        }
    }

    #[test]
    fn byte_round_trip() {
        let id = ObjectId::new();

        assert_eq!(ObjectId::from_bytes(id.bytes()), id);
    }
}
