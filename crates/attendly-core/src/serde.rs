//! Deserializers for query-string fields.
//!
//! Browsers and form-driven clients send `?group=` for "no filter". These
//! helpers map blank strings to `None` instead of failing the whole request,
//! and parse numbers and booleans that arrive as strings inside flattened
//! query structs.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match blank_to_none(opt) {
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match blank_to_none(opt) {
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match blank_to_none(opt).as_deref() {
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a boolean, got `{other}`"
        ))),
        None => Ok(None),
    }
}

pub fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<chrono::NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match blank_to_none(opt) {
        Some(s) => chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date `{s}`, expected YYYY-MM-DD"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_date")]
        day: Option<chrono::NaiveDate>,
    }

    #[test]
    fn test_blank_values_become_none() {
        let p: Probe = serde_json::from_str(r#"{"id":"","flag":" ","day":""}"#).unwrap();
        assert!(p.id.is_none());
        assert!(p.flag.is_none());
        assert!(p.day.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let p: Probe = serde_json::from_str(
            r#"{"id":"12345678-1234-1234-1234-123456789abc","flag":"true","day":"2024-09-02"}"#,
        )
        .unwrap();
        assert!(p.id.is_some());
        assert_eq!(p.flag, Some(true));
        assert_eq!(
            p.day,
            chrono::NaiveDate::from_ymd_opt(2024, 9, 2)
        );
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let result: Result<Probe, _> = serde_json::from_str(r#"{"day":"02.09.2024"}"#);
        assert!(result.is_err());
    }
}
