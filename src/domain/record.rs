//! Patient record types shared by the store, the router, and the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    #[default]
    Unknown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Unknown => "Unknown",
        }
    }

    /// Case-insensitive parse; anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mild" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            _ => Severity::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub indication: String,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergy {
    pub id: String,
    pub allergen: String,
    pub reaction: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(rename = "patientId")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub medications: Vec<Medication>,
    pub allergies: Vec<Allergy>,
    pub conditions: Vec<String>,
}

impl PatientRecord {
    /// The demo patient every session starts from.
    pub fn demo() -> Self {
        Self {
            id: "PAT-12345".into(),
            name: "John Doe".into(),
            age: 65,
            medications: vec![
                Medication {
                    id: "med-1".into(),
                    name: "Lisinopril".into(),
                    dose: "10mg".into(),
                    frequency: "once daily".into(),
                    indication: "Hypertension".into(),
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid seed date"),
                },
                Medication {
                    id: "med-2".into(),
                    name: "Metformin".into(),
                    dose: "500mg".into(),
                    frequency: "twice daily".into(),
                    indication: "Type 2 Diabetes".into(),
                    start_date: NaiveDate::from_ymd_opt(2023, 11, 20).expect("valid seed date"),
                },
            ],
            allergies: vec![Allergy {
                id: "allergy-1".into(),
                allergen: "Penicillin".into(),
                reaction: "Rash".into(),
                severity: Severity::Moderate,
            }],
            conditions: vec![
                "Hypertension".into(),
                "Type 2 Diabetes".into(),
                "Hyperlipidemia".into(),
            ],
        }
    }
}

/// Parameters accepted by the medication-add operation. Fields are
/// optional here so the store can report exactly which ones are missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MedicationInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
}

/// Partial update for the medication-edit operation. Unknown fields are
/// rejected at deserialization time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicationUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
}

impl MedicationUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.dose.is_none()
            && self.frequency.is_none()
            && self.indication.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllergyInput {
    #[serde(default)]
    pub allergen: Option<String>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}
