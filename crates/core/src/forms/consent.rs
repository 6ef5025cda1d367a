use super::{form_date, is_blank, join_present, DocumentKind, FormDocument};
use crate::lenient;
use chrono::NaiveDate;
use forms_pdf::{FieldSpec, FieldValues, Layout};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Patient consent and acknowledgement form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientConsent {
    pub patient_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub agency_name: Option<String>,

    #[serde(deserialize_with = "lenient::flag")]
    pub consent_to_treatment: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub release_of_information: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub financial_responsibility: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub advance_directives_info: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub patient_rights: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub photo_consent: bool,

    pub patient_signature: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub signature_date: Option<NaiveDate>,
    pub representative_name: Option<String>,
    pub representative_relationship: Option<String>,
    pub witness_name: Option<String>,
    pub witness_signature: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub witness_date: Option<NaiveDate>,
}

impl FormDocument for PatientConsent {
    const KIND: DocumentKind = DocumentKind::Consent;

    fn missing_fields(&self) -> Vec<&'static str> {
        if is_blank(&self.patient_name) {
            vec!["patientName"]
        } else {
            Vec::new()
        }
    }

    fn patient_name(&self) -> String {
        join_present(&[self.patient_name.as_deref()])
    }

    fn search_text(&self) -> String {
        join_present(&[
            self.patient_name.as_deref(),
            self.representative_name.as_deref(),
            self.agency_name.as_deref(),
        ])
    }

    fn document_date(&self) -> Option<NaiveDate> {
        self.signature_date
    }

    fn field_values(&self) -> FieldValues {
        FieldValues::new()
            .text("agencyName", self.agency_name.as_ref())
            .text("patientName", self.patient_name.as_ref())
            .text("dateOfBirth", form_date(self.date_of_birth))
            .check("consentToTreatment", self.consent_to_treatment)
            .check("releaseOfInformation", self.release_of_information)
            .check("financialResponsibility", self.financial_responsibility)
            .check("advanceDirectivesInfo", self.advance_directives_info)
            .check("patientRights", self.patient_rights)
            .check("photoConsent", self.photo_consent)
            .signature("patientSignature", self.patient_signature.as_ref())
            .text("signatureDate", form_date(self.signature_date))
            .text("representativeName", self.representative_name.as_ref())
            .text(
                "representativeRelationship",
                self.representative_relationship.as_ref(),
            )
            .text("witnessName", self.witness_name.as_ref())
            .signature("witnessSignature", self.witness_signature.as_ref())
            .text("witnessDate", form_date(self.witness_date))
    }
}

static CONSENT_FIELDS: [FieldSpec; 17] = [
    FieldSpec::text("agencyName", 0, 72.0, 740.0, 11.0, 468.0),
    FieldSpec::text("patientName", 0, 110.0, 700.0, 10.0, 250.0),
    FieldSpec::text("dateOfBirth", 0, 420.0, 700.0, 10.0, 100.0),
    FieldSpec::check("consentToTreatment", 0, 60.0, 620.0, 10.0),
    FieldSpec::check("releaseOfInformation", 0, 60.0, 540.0, 10.0),
    FieldSpec::check("financialResponsibility", 0, 60.0, 460.0, 10.0),
    FieldSpec::check("advanceDirectivesInfo", 0, 60.0, 380.0, 10.0),
    FieldSpec::check("patientRights", 0, 60.0, 300.0, 10.0),
    FieldSpec::check("photoConsent", 0, 60.0, 220.0, 10.0),
    // page 2: signatures
    FieldSpec::text("patientName", 1, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::signature("patientSignature", 1, 72.0, 600.0, 200.0, 40.0),
    FieldSpec::text("signatureDate", 1, 350.0, 610.0, 10.0, 100.0),
    FieldSpec::text("representativeName", 1, 72.0, 540.0, 10.0, 250.0),
    FieldSpec::text("representativeRelationship", 1, 350.0, 540.0, 10.0, 190.0),
    FieldSpec::text("witnessName", 1, 72.0, 460.0, 10.0, 250.0),
    FieldSpec::signature("witnessSignature", 1, 72.0, 400.0, 200.0, 40.0),
    FieldSpec::text("witnessDate", 1, 350.0, 410.0, 10.0, 100.0),
];

pub static CONSENT_LAYOUT: Layout = Layout {
    name: "consent",
    fields: &CONSENT_FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use forms_pdf::FieldValue;

    #[test]
    fn test_requires_patient_name() {
        assert_eq!(PatientConsent::default().missing_fields(), vec!["patientName"]);
    }

    #[test]
    fn test_csv_style_row() {
        let consent: PatientConsent = serde_json::from_value(serde_json::json!({
            "patientName": "Mary Major",
            "consentToTreatment": "TRUE",
            "photoConsent": "no",
            "patientRights": 1,
            "signatureDate": "2024-02-29"
        }))
        .unwrap();

        assert!(consent.validate().is_ok());
        let values = consent.field_values();
        assert_eq!(
            values.get("consentToTreatment"),
            Some(&FieldValue::Checked(true))
        );
        assert_eq!(values.get("photoConsent"), Some(&FieldValue::Checked(false)));
        assert_eq!(values.get("patientRights"), Some(&FieldValue::Checked(true)));
        assert_eq!(
            values.get("signatureDate"),
            Some(&FieldValue::Text("02/29/2024".into()))
        );
        assert_eq!(consent.file_stem(), "Consent_Mary_Major_2024-02-29");
    }

    #[test]
    fn test_layout_spans_two_pages() {
        assert_eq!(CONSENT_LAYOUT.required_pages(), 2);
    }
}
