//! Serde helpers shared by the record types.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format used when sending timestamps to the API.
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp as the clinic API sends it.
///
/// RFC 3339 values keep their wall-clock time in the sender's offset; naive
/// values are taken as clinic-local. A bare date means midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a date, accepting a full timestamp and keeping its date part.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|dt| dt.date()))
}

/// `#[serde(with = "datetime")]` for required timestamps.
pub mod datetime {
    use super::{
        Deserialize, Deserializer, NaiveDateTime, Serializer, WIRE_DATETIME_FORMAT,
        parse_timestamp,
    };

    /// Serialize as `YYYY-MM-DDTHH:MM:SS`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(WIRE_DATETIME_FORMAT))
    }

    /// Deserialize any timestamp format the API uses.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a recognised timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// `#[serde(with = "optional_datetime")]` for optional timestamps.
///
/// Unparseable values become `None` rather than failing the whole record.
pub mod optional_datetime {
    use super::{
        Deserialize, Deserializer, NaiveDateTime, Serializer, WIRE_DATETIME_FORMAT,
        parse_timestamp,
    };

    /// Serialize as `YYYY-MM-DDTHH:MM:SS` or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.collect_str(&dt.format(WIRE_DATETIME_FORMAT)),
            None => s.serialize_none(),
        }
    }

    /// Deserialize an optional timestamp.
    ///
    /// # Errors
    ///
    /// Fails only when the value is neither a string nor null.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }
}

/// `#[serde(with = "optional_date")]` for optional calendar dates.
pub mod optional_date {
    use chrono::NaiveDate;

    use super::{Deserialize, Deserializer, Serializer, parse_date};

    /// Serialize as `YYYY-MM-DD` or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.collect_str(&date.format("%Y-%m-%d")),
            None => s.serialize_none(),
        }
    }

    /// Deserialize an optional date, tolerating full timestamps.
    ///
    /// # Errors
    ///
    /// Fails only when the value is neither a string nor null.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}

/// Format an optional timestamp for display, or an empty string.
#[must_use]
pub fn display_datetime(value: Option<&NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or_default()
}

/// Default for boolean flags the API omits when true.
#[must_use]
pub const fn default_true() -> bool {
    true
}
