//! Tolerant deserializers for form fields.
//!
//! Payloads come from hand-filled wizards and from spreadsheet rows converted to JSON, so the
//! same field can arrive as `true`, `"Yes"`, `"x"` or `1`, and a date as `2024-03-01` or
//! `03/01/2024`. These helpers are used with `#[serde(deserialize_with = ...)]`.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY` or an RFC 3339 timestamp (date part kept).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(input, "%m/%d/%Y").ok())
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
}

/// Interprets common spreadsheet spellings of a checkbox.
pub fn parse_flag(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "x" | "checked" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "" | "off" => Some(false),
        _ => None,
    }
}

/// `null`, missing or blank → `None`; otherwise a date in one of the [`parse_date`] formats.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid date '{}' (expected YYYY-MM-DD or MM/DD/YYYY)",
                s
            ))
        }),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Boolean from a JSON bool, a number (non-zero is true) or a [`parse_flag`] string.
/// `null` and missing are false.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlagRepr>::deserialize(deserializer)? {
        None => Ok(false),
        Some(FlagRepr::Bool(b)) => Ok(b),
        Some(FlagRepr::Number(n)) => Ok(n != 0),
        Some(FlagRepr::Text(s)) => parse_flag(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid yes/no value '{}'", s))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Optional text that may arrive as a number (zip codes, phone and member numbers).
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextRepr>::deserialize(deserializer)? {
        None => None,
        Some(TextRepr::Text(s)) => Some(s),
        Some(TextRepr::Integer(n)) => Some(n.to_string()),
        Some(TextRepr::Float(f)) => Some(f.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "optional_date")]
        date: Option<NaiveDate>,
        #[serde(deserialize_with = "flag")]
        checked: bool,
        #[serde(deserialize_with = "optional_text")]
        zip: Option<String>,
    }

    fn sample(json: &str) -> Result<Sample, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(expected));
        assert_eq!(parse_date("03/01/2024"), Some(expected));
        assert_eq!(parse_date("2024-03-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_date("March 1st"), None);
    }

    #[test]
    fn test_flags() {
        assert!(sample(r#"{"checked": true}"#).unwrap().checked);
        assert!(sample(r#"{"checked": "Yes"}"#).unwrap().checked);
        assert!(sample(r#"{"checked": "x"}"#).unwrap().checked);
        assert!(sample(r#"{"checked": 1}"#).unwrap().checked);
        assert!(!sample(r#"{"checked": "no"}"#).unwrap().checked);
        assert!(!sample(r#"{"checked": null}"#).unwrap().checked);
        assert!(!sample("{}").unwrap().checked);
        assert!(sample(r#"{"checked": "maybe"}"#).is_err());
    }

    #[test]
    fn test_dates() {
        assert_eq!(sample(r#"{"date": ""}"#).unwrap().date, None);
        assert_eq!(
            sample(r#"{"date": "12/31/2023"}"#).unwrap().date,
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert!(sample(r#"{"date": "31/12/2023"}"#).is_err());
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(sample(r#"{"zip": 2134}"#).unwrap().zip.as_deref(), Some("2134"));
        assert_eq!(
            sample(r#"{"zip": "02134"}"#).unwrap().zip.as_deref(),
            Some("02134")
        );
    }
}
