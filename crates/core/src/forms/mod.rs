//! Form models and their page layouts.
//!
//! Every form kind implements [`FormDocument`], which ties the JSON model to its validation
//! rules, the text it is searched by and the values drawn onto its template.

mod consent;
mod nomnc;
mod soc;

pub use consent::{PatientConsent, CONSENT_LAYOUT};
pub use nomnc::{NomncNotice, NOMNC_LAYOUT};
pub use soc::{Medication, SocPacket, SOC_LAYOUT};

use crate::constants::{
    CONSENT_TEMPLATE_FILENAME, FORM_DATE_FORMAT, NOMNC_TEMPLATE_FILENAME, SOC_TEMPLATE_FILENAME,
};
use crate::{FormsError, FormsResult};
use chrono::NaiveDate;
use forms_pdf::{FieldValues, Layout};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The supported form kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Soc,
    Nomnc,
    Consent,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Soc, DocumentKind::Nomnc, DocumentKind::Consent];

    /// Directory name of the collection, also the REST path segment.
    pub fn collection(self) -> &'static str {
        match self {
            DocumentKind::Soc => "soc",
            DocumentKind::Nomnc => "nomnc",
            DocumentKind::Consent => "consent",
        }
    }

    pub fn template_file(self) -> &'static str {
        match self {
            DocumentKind::Soc => SOC_TEMPLATE_FILENAME,
            DocumentKind::Nomnc => NOMNC_TEMPLATE_FILENAME,
            DocumentKind::Consent => CONSENT_TEMPLATE_FILENAME,
        }
    }

    /// Prefix used in download file names.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Soc => "SOC",
            DocumentKind::Nomnc => "NOMNC",
            DocumentKind::Consent => "Consent",
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            DocumentKind::Soc => &SOC_LAYOUT,
            DocumentKind::Nomnc => &NOMNC_LAYOUT,
            DocumentKind::Consent => &CONSENT_LAYOUT,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for DocumentKind {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.collection().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                FormsError::InvalidInput(format!(
                    "unknown form kind '{}' (expected soc, nomnc or consent)",
                    s
                ))
            })
    }
}

/// A form that can be validated, stored, searched and rendered.
pub trait FormDocument: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: DocumentKind;

    /// Wire names of required fields that are absent or blank.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Patient display name used in file names.
    fn patient_name(&self) -> String;

    /// Text matched by list searches: patient name plus identifiers.
    fn search_text(&self) -> String;

    /// The date that best identifies this document, if any.
    fn document_date(&self) -> Option<NaiveDate>;

    /// Values to draw onto the template.
    fn field_values(&self) -> FieldValues;

    fn validate(&self) -> FormsResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormsError::MissingFields(missing))
        }
    }

    fn layout() -> &'static Layout {
        Self::KIND.layout()
    }

    /// File name for a rendered PDF, without extension.
    fn file_stem(&self) -> String {
        download_file_name(Self::KIND.label(), &self.patient_name(), self.document_date())
    }
}

/// Builds a download file stem like `SOC_Jane_Doe_2024-03-01`.
///
/// Whitespace becomes `_`, anything outside `[A-Za-z0-9_-]` is dropped and runs of `_` are
/// collapsed.
pub fn download_file_name(label: &str, patient: &str, date: Option<NaiveDate>) -> String {
    let mut raw = format!("{}_{}", label, patient);
    if let Some(date) = date {
        raw.push('_');
        raw.push_str(&date.format("%Y-%m-%d").to_string());
    }

    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_whitespace() { '_' } else { c };
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            continue;
        }
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        label.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub(crate) fn form_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(FORM_DATE_FORMAT).to_string())
}

/// Non-blank parts joined by single spaces.
pub(crate) fn join_present(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.to_string().parse::<DocumentKind>().unwrap(), kind);
        }
        assert_eq!("SOC".parse::<DocumentKind>().unwrap(), DocumentKind::Soc);
        assert!("intake".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_layouts_are_distinct() {
        assert_eq!(DocumentKind::Soc.layout().name, "soc");
        assert_eq!(DocumentKind::Nomnc.layout().name, "nomnc");
        assert_eq!(DocumentKind::Consent.layout().name, "consent");
    }

    #[test]
    fn test_download_file_name_sanitizes() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(
            download_file_name("SOC", "Jane  O'Neil-Doe", date),
            "SOC_Jane_ONeil-Doe_2024-03-01"
        );
        assert_eq!(
            download_file_name("NOMNC", "../../etc/passwd", None),
            "NOMNC_etcpasswd"
        );
        assert_eq!(download_file_name("Consent", "   ", None), "Consent");
        assert_eq!(download_file_name("Consent", "José", None), "Consent_Jos");
    }

    #[test]
    fn test_helpers() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some("  ".into())));
        assert!(!is_blank(&Some("x".into())));
        assert_eq!(
            form_date(NaiveDate::from_ymd_opt(2024, 12, 9)).as_deref(),
            Some("12/09/2024")
        );
        assert_eq!(
            join_present(&[Some(" Jane "), None, Some(""), Some("Doe")]),
            "Jane Doe"
        );
    }
}
