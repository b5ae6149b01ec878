//! Serde helpers for persisted timestamps.
//!
//! Written as RFC 3339. Read from RFC 3339 or from a Unix timestamp, so blobs
//! written by older releases (millisecond numbers) still load.
//!
//! Use with `#[serde(with = "crate::utils::datetime")]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Timestamps above this are milliseconds (10^11 seconds is year 5138)
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Number(i64),
    }

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::custom(format!("Invalid RFC3339 timestamp {s:?}: {e}"))),
        RawTimestamp::Number(ts) => from_unix(ts)
            .ok_or_else(|| Error::custom(format!("Unix timestamp out of range: {ts}"))),
    }
}

/// Unix seconds or milliseconds, told apart by magnitude
#[must_use]
pub fn from_unix(ts: i64) -> Option<DateTime<Utc>> {
    if ts.abs() > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "crate::utils::datetime")]
        at: DateTime<Utc>,
    }

    #[test]
    fn reads_rfc3339_seconds_and_millis() {
        let expected = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        for json in [
            r#"{"at":"2023-11-14T22:13:20Z"}"#,
            r#"{"at":1700000000}"#,
            r#"{"at":1700000000000}"#,
        ] {
            let parsed: Stamped = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.at, expected, "input {json}");
        }
    }

    #[test]
    fn writes_rfc3339() {
        let stamped = Stamped {
            at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&stamped).unwrap(),
            r#"{"at":"1970-01-01T00:00:00+00:00"}"#
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#).is_err());
    }
}
