use std::{fmt, sync::Arc};

use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{
    codec::{Codec, CodecTarget, coded},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Wire pattern of [`Timestamp`] values, e.g. `2023-06-01T14:22:05.123+0000`.
///
/// Written in `SimpleDateFormat` notation: `yyyy-MM-dd'T'HH:mm:ss.SSSZ`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// What [`TemporalCodec`] does with text that does not match [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Decode to an absent value. Stored data written with another pattern reads
    /// back as `None` without any error.
    #[default]
    Null,
    /// Fail with a [`Format`](DocumentStoreError::Format) error.
    Fail,
}

/// A zoned date-time with millisecond precision on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Wraps a date-time, truncated to whole milliseconds.
    pub fn new(datetime: DateTime<FixedOffset>) -> Self {
        Self(datetime.trunc_subsecs(3))
    }

    /// The current time, truncated to whole milliseconds.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn into_inner(self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::new(value)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value.fixed_offset())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Encodes [`Timestamp`] values as text in [`TIMESTAMP_FORMAT`].
///
/// With the default [`ParseFailurePolicy::Null`], text that cannot be parsed
/// decodes to an absent value instead of an error. Use a `nullable` field, or
/// choose [`ParseFailurePolicy::Fail`], depending on which behaviour callers rely on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalCodec {
    policy: ParseFailurePolicy,
}

impl TemporalCodec {
    pub fn new(policy: ParseFailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ParseFailurePolicy {
        self.policy
    }

    fn parse_failure(&self, value: &Value, reason: String) -> DocumentStoreResult<Option<Timestamp>> {
        match self.policy {
            ParseFailurePolicy::Null => {
                tracing::warn!(%value, %reason, "discarding unparseable timestamp");
                Ok(None)
            }
            ParseFailurePolicy::Fail => Err(DocumentStoreError::Format(format!(
                "invalid timestamp {value}: {reason}"
            ))),
        }
    }
}

impl Codec<Timestamp> for TemporalCodec {
    fn encode(&self, value: &Timestamp) -> DocumentStoreResult<Value> {
        Ok(Value::String(value.0.format(TIMESTAMP_FORMAT).to_string()))
    }

    fn decode(&self, value: &Value) -> DocumentStoreResult<Option<Timestamp>> {
        let Some(text) = value.as_str() else {
            return self.parse_failure(value, "expected a string".to_string());
        };

        match DateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
            Ok(datetime) => Ok(Some(Timestamp(datetime))),
            Err(e) => self.parse_failure(value, e.to_string()),
        }
    }
}

impl CodecTarget for Timestamp {
    fn default_codec() -> Arc<dyn Codec<Self>> {
        Arc::new(TemporalCodec::default())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        coded::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        coded::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Timelike};
    use serde_json::json;

    use super::*;

    fn sample() -> Timestamp {
        let datetime = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_milli_opt(14, 22, 5, 123)
            .unwrap();

        Timestamp::from(Utc.from_utc_datetime(&datetime))
    }

    #[test]
    fn encodes_with_millis_and_numeric_offset() {
        assert_eq!(
            TemporalCodec::default().encode(&sample()).unwrap(),
            json!("2023-06-01T14:22:05.123+0000")
        );
    }

    #[test]
    fn keeps_the_offset_it_was_given() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let timestamp = Timestamp::new(sample().into_inner().with_timezone(&offset));

        assert_eq!(
            TemporalCodec::default().encode(&timestamp).unwrap(),
            json!("2023-06-01T16:22:05.123+0200")
        );
    }

    #[test]
    fn round_trips_at_millisecond_precision() {
        let codec = TemporalCodec::default();

        for timestamp in [sample(), Timestamp::now()] {
            let encoded = codec.encode(&timestamp).unwrap();
            assert_eq!(codec.decode(&encoded).unwrap(), Some(timestamp));
        }
    }

    #[test]
    fn sub_millisecond_precision_is_dropped_on_construction() {
        let datetime = Utc
            .with_ymd_and_hms(2023, 6, 1, 14, 22, 5)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let codec = TemporalCodec::default();
        let timestamp = Timestamp::from(datetime);

        assert_eq!(timestamp.as_datetime().nanosecond(), 123_000_000);
        assert_eq!(codec.decode(&codec.encode(&timestamp).unwrap()).unwrap(), Some(timestamp));
        assert_eq!(Timestamp::new(datetime.fixed_offset()), timestamp);
    }

    #[test]
    fn unparseable_text_is_absent_by_default() {
        let codec = TemporalCodec::default();

        assert_eq!(codec.decode(&json!("June 01, 2023 14:22:05")).unwrap(), None);
        assert_eq!(codec.decode(&json!(17)).unwrap(), None);
    }

    #[test]
    fn unparseable_text_fails_when_asked_to() {
        let codec = TemporalCodec::new(ParseFailurePolicy::Fail);

        assert!(matches!(
            codec.decode(&json!("yesterday")),
            Err(DocumentStoreError::Format(_))
        ));
    }
}
