use std::{fmt, sync::Arc};

use chrono::{DateTime, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{
    codec::{Codec, CodecTarget, coded},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Default wire pattern for plain [`Date`] values, e.g. `June 01, 2023 14:22:05`.
///
/// Written in `SimpleDateFormat` notation: `MMMM dd, yyyy HH:mm:ss`. Second
/// precision, no zone. Deliberately distinct from
/// [`TIMESTAMP_FORMAT`](super::TIMESTAMP_FORMAT); stored data may use either.
pub const DATE_FORMAT: &str = "%B %d, %Y %H:%M:%S";

/// A zone-less calendar date and wall-clock time, stored at second precision.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(NaiveDateTime);

impl Date {
    /// Wraps a date-time, dropping any fractional seconds.
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime.trunc_subsecs(0))
    }

    pub fn as_datetime(&self) -> &NaiveDateTime {
        &self.0
    }

    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for Date {
    fn from(value: NaiveDateTime) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({})", self.0.format(DATE_FORMAT))
    }
}

/// Encodes [`Date`] values as text in [`DATE_FORMAT`].
///
/// Decoding also accepts RFC 3339 text and keeps its local wall-clock time.
/// Anything else is a [`Serialization`](DocumentStoreError::Serialization) error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl Codec<Date> for DateCodec {
    fn encode(&self, value: &Date) -> DocumentStoreResult<Value> {
        Ok(Value::String(value.0.format(DATE_FORMAT).to_string()))
    }

    fn decode(&self, value: &Value) -> DocumentStoreResult<Option<Date>> {
        let text = value.as_str().ok_or_else(|| {
            DocumentStoreError::Serialization(format!("expected a date string, found {value}"))
        })?;

        NaiveDateTime::parse_from_str(text, DATE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(|datetime| datetime.naive_local()))
            .map(|datetime| Some(Date::new(datetime)))
            .map_err(|e| DocumentStoreError::Serialization(format!("unparseable date {text:?}: {e}")))
    }
}

impl CodecTarget for Date {
    fn default_codec() -> Arc<dyn Codec<Self>> {
        Arc::new(DateCodec)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        coded::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        coded::deserialize(deserializer)
    }
}
