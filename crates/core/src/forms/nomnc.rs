use super::{form_date, is_blank, join_present, DocumentKind, FormDocument};
use crate::lenient;
use chrono::NaiveDate;
use forms_pdf::{FieldSpec, FieldValues, Layout};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Notice of Medicare Non-Coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NomncNotice {
    pub patient_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub patient_number: Option<String>,
    pub service_type: Option<String>,
    /// Last day covered services continue.
    #[serde(deserialize_with = "lenient::optional_date")]
    pub effective_date: Option<NaiveDate>,
    pub agency_name: Option<String>,
    pub plan_contact_info: Option<String>,
    pub additional_info: Option<String>,
    pub patient_signature: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub signature_date: Option<NaiveDate>,
    pub representative_name: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub refused_to_sign: bool,
    pub refusal_witness: Option<String>,
}

impl FormDocument for NomncNotice {
    const KIND: DocumentKind = DocumentKind::Nomnc;

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.patient_name) {
            missing.push("patientName");
        }
        if self.effective_date.is_none() {
            missing.push("effectiveDate");
        }
        missing
    }

    fn patient_name(&self) -> String {
        join_present(&[self.patient_name.as_deref()])
    }

    fn search_text(&self) -> String {
        join_present(&[
            self.patient_name.as_deref(),
            self.patient_number.as_deref(),
            self.service_type.as_deref(),
        ])
    }

    fn document_date(&self) -> Option<NaiveDate> {
        self.effective_date
    }

    fn field_values(&self) -> FieldValues {
        FieldValues::new()
            .text("agencyName", self.agency_name.as_ref())
            .text("patientName", self.patient_name.as_ref())
            .text("patientNumber", self.patient_number.as_ref())
            .text("serviceType", self.service_type.as_ref())
            .text("effectiveDate", form_date(self.effective_date))
            .text("planContactInfo", self.plan_contact_info.as_ref())
            .text("additionalInfo", self.additional_info.as_ref())
            .signature("patientSignature", self.patient_signature.as_ref())
            .text("signatureDate", form_date(self.signature_date))
            .text("representativeName", self.representative_name.as_ref())
            .check("refusedToSign", self.refused_to_sign)
            .text("refusalWitness", self.refusal_witness.as_ref())
    }
}

static NOMNC_FIELDS: [FieldSpec; 13] = [
    FieldSpec::text("agencyName", 0, 72.0, 740.0, 11.0, 468.0),
    FieldSpec::text("patientName", 0, 110.0, 700.0, 10.0, 250.0),
    FieldSpec::text("patientNumber", 0, 420.0, 700.0, 10.0, 130.0),
    FieldSpec::text("serviceType", 0, 150.0, 610.0, 10.0, 300.0),
    FieldSpec::text("effectiveDate", 0, 380.0, 585.0, 10.0, 100.0),
    FieldSpec::paragraph("planContactInfo", 0, 72.0, 200.0, 9.0, 468.0, 11.0, 3),
    // page 2
    FieldSpec::text("patientName", 1, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::paragraph("additionalInfo", 1, 72.0, 680.0, 10.0, 468.0, 12.0, 6),
    FieldSpec::signature("patientSignature", 1, 72.0, 430.0, 200.0, 40.0),
    FieldSpec::text("signatureDate", 1, 350.0, 440.0, 10.0, 100.0),
    FieldSpec::text("representativeName", 1, 72.0, 400.0, 10.0, 250.0),
    FieldSpec::check("refusedToSign", 1, 72.0, 360.0, 10.0),
    FieldSpec::text("refusalWitness", 1, 200.0, 362.0, 10.0, 250.0),
];

pub static NOMNC_LAYOUT: Layout = Layout {
    name: "nomnc",
    fields: &NOMNC_FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use forms_pdf::FieldValue;

    #[test]
    fn test_missing_fields() {
        let notice = NomncNotice::default();
        assert_eq!(notice.missing_fields(), vec!["patientName", "effectiveDate"]);

        let notice: NomncNotice = serde_json::from_value(serde_json::json!({
            "patientName": "John Roe",
            "effectiveDate": "06/30/2024"
        }))
        .unwrap();
        assert!(notice.validate().is_ok());
        assert_eq!(notice.file_stem(), "NOMNC_John_Roe_2024-06-30");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let result: Result<NomncNotice, _> = serde_json::from_value(serde_json::json!({
            "patientName": "John Roe",
            "effectiveDate": "someday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_values() {
        let notice = NomncNotice {
            patient_name: Some("John Roe".into()),
            patient_number: Some("A-123".into()),
            effective_date: NaiveDate::from_ymd_opt(2024, 6, 30),
            refused_to_sign: true,
            refusal_witness: Some("Nurse Ratched".into()),
            ..Default::default()
        };
        let values = notice.field_values();
        assert_eq!(
            values.get("effectiveDate"),
            Some(&FieldValue::Text("06/30/2024".into()))
        );
        assert_eq!(values.get("refusedToSign"), Some(&FieldValue::Checked(true)));
        assert!(values.get("patientSignature").is_none());
        assert!(notice.search_text().contains("A-123"));
    }

    #[test]
    fn test_layout_spans_two_pages() {
        assert_eq!(NOMNC_LAYOUT.required_pages(), 2);
    }
}
