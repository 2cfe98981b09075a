//! Conversion between JSON text and native BSON documents.
//!
//! The serializer speaks JSON; the store speaks BSON. This module bridges the two
//! using the extended-JSON conventions the codecs emit:
//!
//! | JSON                                   | BSON                 |
//! |----------------------------------------|----------------------|
//! | `{"$oid": "<24 hex chars>"}`           | `ObjectId`           |
//! | `{"$date": <millis>}`                  | `DateTime`           |
//! | `{"$date": {"$numberLong": "<millis>"}}` | `DateTime`         |
//! | integer fitting in 32 bits             | `Int32`              |
//! | other integer                          | `Int64`              |
//! | fractional number                      | `Double`             |
//!
//! Values that would change on the way across are rejected: integers above
//! `i64::MAX`, and NaN or infinite doubles, which JSON cannot carry.

use bson::{Bson, DateTime, Document, oid};
use serde_json::{Map, Number, Value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Parses JSON text that must hold an object into a BSON document.
pub fn parse_document(json: &str) -> DocumentStoreResult<Document> {
    into_document(serde_json::from_str(json)?)
}

/// Converts a JSON value that must be an object into a BSON document.
pub fn into_document(value: Value) -> DocumentStoreResult<Document> {
    match json_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected a JSON object, found {:?}",
            other.element_type()
        ))),
    }
}

/// Renders a BSON document as JSON text.
pub fn to_json_string(document: &Document) -> DocumentStoreResult<String> {
    Ok(serde_json::to_string(&document_to_json(document)?)?)
}

/// Converts a BSON document to a JSON object.
pub fn document_to_json(document: &Document) -> DocumentStoreResult<Value> {
    Ok(Value::Object(
        document
            .iter()
            .map(|(key, value)| Ok((key.clone(), bson_to_json(value)?)))
            .collect::<DocumentStoreResult<Map<String, Value>>>()?,
    ))
}

/// Converts a JSON value to BSON, recognising `$oid` and `$date` wrappers.
pub fn json_to_bson(value: Value) -> DocumentStoreResult<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => number_to_bson(&n)?,
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(
            items
                .into_iter()
                .map(json_to_bson)
                .collect::<DocumentStoreResult<Vec<_>>>()?,
        ),
        Value::Object(map) => {
            if let Some(special) = special_to_bson(&map)? {
                return Ok(special);
            }

            Bson::Document(
                map.into_iter()
                    .map(|(key, value)| Ok((key, json_to_bson(value)?)))
                    .collect::<DocumentStoreResult<Document>>()?,
            )
        }
    })
}

/// Converts a BSON value to JSON, emitting `$oid` and `$date` wrappers.
///
/// # Errors
///
/// Element types with no JSON form here (binary, regex, decimal128, ...) and
/// non-finite doubles are a [`Serialization`](DocumentStoreError::Serialization) error.
pub fn bson_to_json(value: &Bson) -> DocumentStoreResult<Value> {
    Ok(match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Value::Number(Number::from_f64(*f).ok_or_else(|| {
            DocumentStoreError::Serialization(format!("double {f} has no JSON representation"))
        })?),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(
            items
                .iter()
                .map(bson_to_json)
                .collect::<DocumentStoreResult<Vec<_>>>()?,
        ),
        Bson::Document(document) => document_to_json(document)?,
        Bson::ObjectId(id) => serde_json::json!({ "$oid": id.to_hex() }),
        Bson::DateTime(datetime) => serde_json::json!({ "$date": datetime.timestamp_millis() }),
        other => {
            return Err(DocumentStoreError::Serialization(format!(
                "BSON element type {:?} has no JSON representation",
                other.element_type()
            )));
        }
    })
}

fn number_to_bson(number: &Number) -> DocumentStoreResult<Bson> {
    if let Some(i) = number.as_i64() {
        return Ok(match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        });
    }

    match number.as_f64() {
        Some(f) if !number.is_u64() => Ok(Bson::Double(f)),
        _ => Err(DocumentStoreError::Serialization(format!(
            "integer {number} does not fit in a 64-bit signed integer"
        ))),
    }
}

fn special_to_bson(map: &Map<String, Value>) -> DocumentStoreResult<Option<Bson>> {
    if map.len() != 1 {
        return Ok(None);
    }

    match map.iter().next() {
        Some((key, Value::String(hex))) if key == "$oid" => oid::ObjectId::parse_str(hex)
            .map(|id| Some(Bson::ObjectId(id)))
            .map_err(|e| DocumentStoreError::Format(format!("invalid object id {hex:?}: {e}"))),
        Some((key, value)) if key == "$date" => Ok(date_millis(value)
            .map(|millis| Bson::DateTime(DateTime::from_millis(millis)))),
        _ => Ok(None),
    }
}

fn date_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(inner) if inner.len() == 1 => inner
            .get("$numberLong")
            .and_then(Value::as_str)
            .and_then(|text| text.parse().ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_oid_into_native_object_id() {
        let document = parse_document(
            r#"{"_id":{"$oid":"507f1f77bcf86cd799439011"},"name":"Ada","age":36,"score":1.5,"big":8589934592}"#,
        )
        .unwrap();

        assert_eq!(
            document,
            doc! {
                "_id": oid::ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap(),
                "name": "Ada",
                "age": 36_i32,
                "score": 1.5,
                "big": 8_589_934_592_i64,
            }
        );
    }

    #[test]
    fn renders_native_values_as_extended_json() {
        let id = oid::ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let document = doc! {
            "_id": id,
            "when": DateTime::from_millis(1_685_629_325_123),
            "nested": { "tags": ["a", "b"], "flag": true },
        };

        assert_eq!(
            document_to_json(&document).unwrap(),
            json!({
                "_id": { "$oid": "507f1f77bcf86cd799439011" },
                "when": { "$date": 1_685_629_325_123_i64 },
                "nested": { "tags": ["a", "b"], "flag": true },
            })
        );
    }

    #[test]
    fn accepts_both_date_forms() {
        let expected = Bson::DateTime(DateTime::from_millis(42));

        assert_eq!(json_to_bson(json!({ "$date": 42 })).unwrap(), expected);
        assert_eq!(json_to_bson(json!({ "$date": { "$numberLong": "42" } })).unwrap(), expected);
    }

    #[test]
    fn keeps_lookalike_objects_as_documents() {
        assert_eq!(
            json_to_bson(json!({ "$oid": "507f1f77bcf86cd799439011", "extra": 1 })).unwrap(),
            Bson::Document(doc! { "$oid": "507f1f77bcf86cd799439011", "extra": 1_i32 })
        );
    }

    #[test]
    fn malformed_oid_is_a_format_error() {
        assert!(matches!(
            parse_document(r#"{"_id":{"$oid":"nope"}}"#),
            Err(DocumentStoreError::Format(_))
        ));
    }

    #[test]
    fn top_level_must_be_an_object() {
        assert!(matches!(
            parse_document(r#"[1,2,3]"#),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert!(matches!(
            parse_document(r#""wibble""#),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn lossy_numbers_are_rejected() {
        assert!(matches!(
            json_to_bson(json!(u64::MAX)),
            Err(DocumentStoreError::Serialization(_))
        ));
        assert!(matches!(
            document_to_json(&doc! { "ratio": f64::NAN }),
            Err(DocumentStoreError::Serialization(_))
        ));
        assert!(matches!(
            document_to_json(&doc! { "ratio": f64::INFINITY }),
            Err(DocumentStoreError::Serialization(_))
        ));
        assert_eq!(json_to_bson(json!(i64::MAX)).unwrap(), Bson::Int64(i64::MAX));
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let document = doc! { "upper": Bson::MaxKey };

        assert!(matches!(
            document_to_json(&document),
            Err(DocumentStoreError::Serialization(_))
        ));
    }
}
