//! Serde helpers for exchange payloads that encode numbers as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};
use std::str::FromStr;

/// Deserialize a `String` (or `&str`) as the desired type.
pub fn de_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let data: std::borrow::Cow<'de, str> = Deserialize::deserialize(deserializer)?;
    data.trim().parse::<T>().map_err(Error::custom)
}

/// Deserialize an optional numeric string, treating blank strings as `None`.
pub fn de_opt_str_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<std::borrow::Cow<'de, str>> = Option::deserialize(deserializer)?;
    match value {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(Error::custom),
        None => Ok(None),
    }
}

/// Deserialize a `u64` milliseconds value as `DateTime<Utc>`.
pub fn de_u64_epoch_ms_as_datetime_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let epoch_ms = i64::deserialize(deserializer)?;
    DateTime::from_timestamp_millis(epoch_ms)
        .ok_or_else(|| Error::custom(format!("invalid epoch ms: {epoch_ms}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(deserialize_with = "de_str")]
        price: f64,
        #[serde(default, deserialize_with = "de_opt_str_f64")]
        rate: Option<f64>,
        #[serde(deserialize_with = "de_u64_epoch_ms_as_datetime_utc")]
        time: DateTime<Utc>,
    }

    #[test]
    fn test_de_string_numbers() {
        let payload: Payload =
            serde_json::from_str(r#"{"price":"101.5","rate":"","time":1700000000000}"#).unwrap();
        assert_eq!(payload.price, 101.5);
        assert_eq!(payload.rate, None);
        assert_eq!(payload.time.timestamp_millis(), 1_700_000_000_000);

        let payload: Payload =
            serde_json::from_str(r#"{"price":" 7 ","rate":"0.0001","time":0}"#).unwrap();
        assert_eq!(payload.price, 7.0);
        assert_eq!(payload.rate, Some(0.0001));
    }

    #[test]
    fn test_de_str_rejects_garbage() {
        assert!(serde_json::from_str::<Payload>(r#"{"price":"abc","time":0}"#).is_err());
    }
}
