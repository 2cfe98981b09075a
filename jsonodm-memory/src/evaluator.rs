//! Filter evaluation for in-memory documents.
//!
//! Filters are field-equality documents, matched the way a document store would:
//! every filter field must be present with an equal value. Integers compare
//! exactly, and equal a double only when the double holds that exact integer.
//! An array field matches when any of its elements is equal, and a null filter
//! value matches a missing field.

use std::collections::HashMap;
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};


/// Type-erased, comparable representation of BSON values.
///
/// Integer types are widened to i64 so `Int32(3)` and `Int64(3)` compare equal;
/// `Double(3.0)` equals them too, but no integer is ever rounded to a double.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other element type, compared as-is
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(i), Comparable::Double(d)) | (Comparable::Double(d), Comparable::Int(i)) => {
                int_equals_double(*i, *d)
            },
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// `d` must be integral and inside the i64 range; `i64::MAX as f64` is 2^63, itself out of range.
fn int_equals_double(i: i64, d: f64) -> bool {
    d.fract() == 0.0
        && d >= i64::MIN as f64
        && d < i64::MAX as f64
        && d as i64 == i
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every field of `filter`.
    pub fn matches(&self, filter: &Document) -> bool {
        filter
            .iter()
            .all(|(field, expected)| self.field_matches(field, expected))
    }

    fn field_matches(&self, field: &str, expected: &Bson) -> bool {
        let expected = Comparable::from(expected);

        match self.document.get(field) {
            Some(actual) => match Comparable::from(actual) {
                Comparable::Array(items) if !matches!(expected, Comparable::Array(_)) => {
                    items.iter().any(|item| item == &expected)
                },
                actual => actual == expected,
            },
            None => expected == Comparable::Null,
        }
    }
}
