use super::{form_date, is_blank, join_present, DocumentKind, FormDocument};
use crate::lenient;
use chrono::{Datelike, NaiveDate};
use forms_pdf::{Column, FieldSpec, FieldValues, Layout, Row};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Start of Care intake packet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SocPacket {
    // patient
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_initial: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub zip_code: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub medicare_number: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub medicaid_number: Option<String>,

    // episode
    #[serde(deserialize_with = "lenient::optional_date")]
    pub soc_date: Option<NaiveDate>,
    pub referral_source: Option<String>,
    pub primary_diagnosis: Option<String>,
    pub secondary_diagnosis: Option<String>,
    pub allergies: Option<String>,
    pub homebound_reason: Option<String>,

    // physician
    pub physician_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub physician_phone: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub physician_npi: Option<String>,

    // emergency contact
    pub emergency_contact_name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,

    // ordered services
    #[serde(deserialize_with = "lenient::flag")]
    pub skilled_nursing: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub physical_therapy: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub occupational_therapy: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub speech_therapy: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub home_health_aide: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub medical_social_services: bool,

    #[serde(deserialize_with = "lenient::flag")]
    pub advance_directive: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub dnr: bool,

    pub medications: Vec<Medication>,

    // sign-off
    pub clinician_name: Option<String>,
    /// Base64 PNG/JPEG or a `data:` URL.
    pub clinician_signature: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub clinician_signature_date: Option<NaiveDate>,
    pub patient_signature: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub patient_signature_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// One line of the medication profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Medication {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub dose: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<String>,
    #[serde(deserialize_with = "lenient::optional_date")]
    pub start_date: Option<NaiveDate>,
    /// New or changed since the last episode.
    #[serde(deserialize_with = "lenient::flag")]
    pub is_new: bool,
}

impl Medication {
    fn to_row(&self) -> Option<Row> {
        if is_blank(&self.name) {
            return None;
        }
        let mut row = Row::new();
        let cells = [
            ("name", self.name.clone()),
            ("dose", self.dose.clone()),
            ("frequency", self.frequency.clone()),
            ("route", self.route.clone()),
            ("startDate", form_date(self.start_date)),
            ("change", self.is_new.then(|| "New".to_string())),
        ];
        for (key, value) in cells {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                row.insert(key.to_string(), value.trim().to_string());
            }
        }
        Some(row)
    }
}

impl SocPacket {
    /// Whole years between date of birth and the start of care.
    pub fn age_at_soc(&self) -> Option<u32> {
        let dob = self.date_of_birth?;
        let soc = self.soc_date?;
        let mut years = soc.year() - dob.year();
        if (soc.month(), soc.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// "Last, First M" for page headers.
    fn header_name(&self) -> String {
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let given = join_present(&[self.first_name.as_deref(), self.middle_initial.as_deref()]);
        match (last.is_empty(), given.is_empty()) {
            (false, false) => format!("{}, {}", last, given),
            (false, true) => last.to_string(),
            _ => given,
        }
    }
}

impl FormDocument for SocPacket {
    const KIND: DocumentKind = DocumentKind::Soc;

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.first_name) {
            missing.push("firstName");
        }
        if is_blank(&self.last_name) {
            missing.push("lastName");
        }
        if self.soc_date.is_none() {
            missing.push("socDate");
        }
        missing
    }

    fn patient_name(&self) -> String {
        join_present(&[self.first_name.as_deref(), self.last_name.as_deref()])
    }

    fn search_text(&self) -> String {
        join_present(&[
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.medicare_number.as_deref(),
            self.medicaid_number.as_deref(),
            self.phone.as_deref(),
        ])
    }

    fn document_date(&self) -> Option<NaiveDate> {
        self.soc_date
    }

    fn field_values(&self) -> FieldValues {
        let medications = self.medications.iter().filter_map(Medication::to_row).collect();

        FieldValues::new()
            .text("headerName", Some(self.header_name()))
            .text("firstName", self.first_name.as_ref())
            .text("lastName", self.last_name.as_ref())
            .text("middleInitial", self.middle_initial.as_ref())
            .text("dateOfBirth", form_date(self.date_of_birth))
            .text("age", self.age_at_soc().map(|a| a.to_string()))
            .text("gender", self.gender.as_ref())
            .text("address", self.address.as_ref())
            .text("city", self.city.as_ref())
            .text("state", self.state.as_ref())
            .text("zipCode", self.zip_code.as_ref())
            .text("phone", self.phone.as_ref())
            .text("medicareNumber", self.medicare_number.as_ref())
            .text("medicaidNumber", self.medicaid_number.as_ref())
            .text("emergencyContactName", self.emergency_contact_name.as_ref())
            .text(
                "emergencyContactRelationship",
                self.emergency_contact_relationship.as_ref(),
            )
            .text("emergencyContactPhone", self.emergency_contact_phone.as_ref())
            .text("physicianName", self.physician_name.as_ref())
            .text("physicianPhone", self.physician_phone.as_ref())
            .text("physicianNpi", self.physician_npi.as_ref())
            .text("socDate", form_date(self.soc_date))
            .text("referralSource", self.referral_source.as_ref())
            .text("primaryDiagnosis", self.primary_diagnosis.as_ref())
            .text("secondaryDiagnosis", self.secondary_diagnosis.as_ref())
            .text("allergies", self.allergies.as_ref())
            .text("homeboundReason", self.homebound_reason.as_ref())
            .check("skilledNursing", self.skilled_nursing)
            .check("physicalTherapy", self.physical_therapy)
            .check("occupationalTherapy", self.occupational_therapy)
            .check("speechTherapy", self.speech_therapy)
            .check("homeHealthAide", self.home_health_aide)
            .check("medicalSocialServices", self.medical_social_services)
            .check("advanceDirective", self.advance_directive)
            .check("dnr", self.dnr)
            .rows("medications", medications)
            .text("notes", self.notes.as_ref())
            .text("clinicianName", self.clinician_name.as_ref())
            .signature("clinicianSignature", self.clinician_signature.as_ref())
            .text("clinicianSignatureDate", form_date(self.clinician_signature_date))
            .signature("patientSignature", self.patient_signature.as_ref())
            .text("patientName", Some(self.patient_name()))
            .text("patientSignatureDate", form_date(self.patient_signature_date))
    }
}

static MEDICATION_COLUMNS: [Column; 6] = [
    Column {
        key: "name",
        x_offset: 0.0,
        max_width: 170.0,
    },
    Column {
        key: "dose",
        x_offset: 178.0,
        max_width: 72.0,
    },
    Column {
        key: "frequency",
        x_offset: 258.0,
        max_width: 92.0,
    },
    Column {
        key: "route",
        x_offset: 358.0,
        max_width: 62.0,
    },
    Column {
        key: "startDate",
        x_offset: 428.0,
        max_width: 56.0,
    },
    Column {
        key: "change",
        x_offset: 492.0,
        max_width: 36.0,
    },
];

static SOC_FIELDS: [FieldSpec; 45] = [
    // page 1: demographics
    FieldSpec::text("headerName", 0, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::text("lastName", 0, 72.0, 690.0, 10.0, 160.0),
    FieldSpec::text("firstName", 0, 250.0, 690.0, 10.0, 160.0),
    FieldSpec::text("middleInitial", 0, 430.0, 690.0, 10.0, 30.0),
    FieldSpec::text("dateOfBirth", 0, 72.0, 655.0, 10.0, 100.0),
    FieldSpec::text("age", 0, 200.0, 655.0, 10.0, 40.0),
    FieldSpec::text("gender", 0, 260.0, 655.0, 10.0, 100.0),
    FieldSpec::text("address", 0, 72.0, 620.0, 10.0, 468.0),
    FieldSpec::text("city", 0, 72.0, 585.0, 10.0, 210.0),
    FieldSpec::text("state", 0, 300.0, 585.0, 10.0, 50.0),
    FieldSpec::text("zipCode", 0, 360.0, 585.0, 10.0, 80.0),
    FieldSpec::text("phone", 0, 450.0, 585.0, 10.0, 100.0),
    FieldSpec::text("medicareNumber", 0, 72.0, 550.0, 10.0, 210.0),
    FieldSpec::text("medicaidNumber", 0, 300.0, 550.0, 10.0, 210.0),
    FieldSpec::text("emergencyContactName", 0, 72.0, 480.0, 10.0, 210.0),
    FieldSpec::text("emergencyContactRelationship", 0, 300.0, 480.0, 10.0, 140.0),
    FieldSpec::text("emergencyContactPhone", 0, 450.0, 480.0, 10.0, 100.0),
    FieldSpec::text("physicianName", 0, 72.0, 410.0, 10.0, 210.0),
    FieldSpec::text("physicianPhone", 0, 300.0, 410.0, 10.0, 140.0),
    FieldSpec::text("physicianNpi", 0, 450.0, 410.0, 10.0, 100.0),
    // page 2: clinical
    FieldSpec::text("headerName", 1, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::text("socDate", 1, 72.0, 690.0, 10.0, 100.0),
    FieldSpec::text("referralSource", 1, 250.0, 690.0, 10.0, 290.0),
    FieldSpec::paragraph("primaryDiagnosis", 1, 72.0, 650.0, 10.0, 468.0, 12.0, 2),
    FieldSpec::paragraph("secondaryDiagnosis", 1, 72.0, 610.0, 10.0, 468.0, 12.0, 2),
    FieldSpec::paragraph("allergies", 1, 72.0, 570.0, 10.0, 468.0, 12.0, 2),
    FieldSpec::paragraph("homeboundReason", 1, 72.0, 520.0, 10.0, 468.0, 12.0, 3),
    FieldSpec::check("skilledNursing", 1, 72.0, 440.0, 10.0),
    FieldSpec::check("physicalTherapy", 1, 72.0, 420.0, 10.0),
    FieldSpec::check("occupationalTherapy", 1, 72.0, 400.0, 10.0),
    FieldSpec::check("speechTherapy", 1, 300.0, 440.0, 10.0),
    FieldSpec::check("homeHealthAide", 1, 300.0, 420.0, 10.0),
    FieldSpec::check("medicalSocialServices", 1, 300.0, 400.0, 10.0),
    FieldSpec::check("advanceDirective", 1, 72.0, 340.0, 10.0),
    FieldSpec::check("dnr", 1, 300.0, 340.0, 10.0),
    // page 3: medication profile
    FieldSpec::text("headerName", 2, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::rows("medications", 2, 50.0, 680.0, 9.0, 18.0, 20, &MEDICATION_COLUMNS),
    // page 4: notes and signatures
    FieldSpec::text("headerName", 3, 400.0, 752.0, 9.0, 170.0),
    FieldSpec::paragraph("notes", 3, 72.0, 680.0, 10.0, 468.0, 12.0, 10),
    FieldSpec::text("clinicianName", 3, 72.0, 420.0, 10.0, 210.0),
    FieldSpec::signature("clinicianSignature", 3, 72.0, 360.0, 180.0, 45.0),
    FieldSpec::text("clinicianSignatureDate", 3, 300.0, 370.0, 10.0, 100.0),
    FieldSpec::signature("patientSignature", 3, 72.0, 270.0, 180.0, 45.0),
    FieldSpec::text("patientSignatureDate", 3, 300.0, 280.0, 10.0, 100.0),
    FieldSpec::text("patientName", 3, 72.0, 240.0, 10.0, 210.0),
];

pub static SOC_LAYOUT: Layout = Layout {
    name: "soc",
    fields: &SOC_FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use forms_pdf::FieldValue;

    fn packet() -> SocPacket {
        serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "middleInitial": "Q",
            "dateOfBirth": "03/15/1940",
            "socDate": "2024-03-01",
            "zipCode": 2134,
            "skilledNursing": "Yes",
            "dnr": "x",
            "physicalTherapy": "",
            "medications": [
                { "name": "Metformin", "dose": "500 mg", "startDate": "01/02/2024", "isNew": "y" },
                { "name": "", "dose": "ignored" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_lenient_payload() {
        let soc = packet();
        assert_eq!(soc.zip_code.as_deref(), Some("2134"));
        assert!(soc.skilled_nursing);
        assert!(soc.dnr);
        assert!(!soc.physical_therapy);
        assert!(soc.medications[0].is_new);
        assert_eq!(soc.medications.len(), 2);
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let soc = SocPacket {
            first_name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(soc.missing_fields(), vec!["firstName", "lastName", "socDate"]);
        assert!(packet().validate().is_ok());
    }

    #[test]
    fn test_age_at_soc() {
        let soc = packet();
        // birthday falls after the start of care
        assert_eq!(soc.age_at_soc(), Some(83));

        let mut later = packet();
        later.soc_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(later.age_at_soc(), Some(84));

        let mut unborn = packet();
        unborn.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1);
        assert_eq!(unborn.age_at_soc(), None);
    }

    #[test]
    fn test_field_values() {
        let values = packet().field_values();
        assert_eq!(
            values.get("headerName"),
            Some(&FieldValue::Text("Doe, Jane Q".into()))
        );
        assert_eq!(
            values.get("dateOfBirth"),
            Some(&FieldValue::Text("03/15/1940".into()))
        );
        assert_eq!(values.get("age"), Some(&FieldValue::Text("83".into())));
        assert_eq!(values.get("dnr"), Some(&FieldValue::Checked(true)));
        assert!(values.get("notes").is_none());

        let Some(FieldValue::Rows(rows)) = values.get("medications") else {
            panic!("medications should be rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("startDate").map(String::as_str), Some("01/02/2024"));
        assert_eq!(rows[0].get("change").map(String::as_str), Some("New"));
        assert!(rows[0].get("route").is_none());
    }

    #[test]
    fn test_layout_spans_four_pages() {
        assert_eq!(SOC_LAYOUT.required_pages(), 4);
        for key in ["medications", "notes", "clinicianSignature", "dnr"] {
            assert!(SOC_LAYOUT.field(key).is_some(), "{key} should be placed");
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(packet().file_stem(), "SOC_Jane_Doe_2024-03-01");
    }
}
