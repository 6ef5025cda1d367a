//! Values to draw, keyed like the layout they are rendered against.

use std::collections::BTreeMap;

/// One row of a repeating table: column key → cell text.
pub type Row = BTreeMap<String, String>;

/// A value for a single layout field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
    /// Base64 image data, optionally wrapped in a `data:image/...;base64,` URL.
    Signature(String),
    Rows(Vec<Row>),
}

/// The full set of values for one document.
///
/// The builder helpers drop absent and blank values so a renderer only ever sees something
/// worth drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    /// Adds trimmed text when present and non-blank.
    pub fn text<S: AsRef<str>>(mut self, key: &str, value: Option<S>) -> Self {
        if let Some(text) = value {
            let text = text.as_ref().trim();
            if !text.is_empty() {
                self.insert(key, FieldValue::Text(text.to_string()));
            }
        }
        self
    }

    pub fn check(mut self, key: &str, checked: bool) -> Self {
        self.insert(key, FieldValue::Checked(checked));
        self
    }

    /// Adds signature image data when present and non-blank.
    pub fn signature<S: AsRef<str>>(mut self, key: &str, value: Option<S>) -> Self {
        if let Some(data) = value {
            let data = data.as_ref().trim();
            if !data.is_empty() {
                self.insert(key, FieldValue::Signature(data.to_string()));
            }
        }
        self
    }

    /// Adds table rows, skipping the field entirely when there are none.
    pub fn rows(mut self, key: &str, rows: Vec<Row>) -> Self {
        if !rows.is_empty() {
            self.insert(key, FieldValue::Rows(rows));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_skip_blank_values() {
        let values = FieldValues::new()
            .text("firstName", Some("  Jane "))
            .text("lastName", Some("   "))
            .text("middleInitial", None::<&str>)
            .signature("patientSignature", Some(""))
            .rows("medications", vec![])
            .check("dnr", false);

        let expected = FieldValues::new()
            .text("firstName", Some("Jane"))
            .check("dnr", false);
        assert_eq!(values, expected);
        assert_eq!(
            values.get("firstName"),
            Some(&FieldValue::Text("Jane".into()))
        );
        assert_eq!(values.get("dnr"), Some(&FieldValue::Checked(false)));
        assert!(values.get("lastName").is_none());
        assert!(values.get("patientSignature").is_none());
        assert!(values.get("medications").is_none());
    }

    #[test]
    fn test_rows_are_kept() {
        let mut row = Row::new();
        row.insert("name".into(), "Lisinopril".into());
        let values = FieldValues::new().rows("medications", vec![row.clone()]);
        assert_eq!(values.get("medications"), Some(&FieldValue::Rows(vec![row])));
    }
}
