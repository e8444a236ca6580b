//! Authoritative in-memory patient record and its validated mutations.
//!
//! Every mutation is reachable only through the tool router; callers get
//! clones, never views into the record.

use crate::domain::record::{
    Allergy, AllergyInput, Medication, MedicationInput, MedicationUpdate, PatientRecord, Severity,
};
use chrono::Local;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_INDICATION: &str = "Not specified";
const DEFAULT_REACTION: &str = "Unknown reaction";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Validation(String),
    #[error("Medication with ID/name '{0}' not found")]
    NotFound(String),
    #[error("Medication '{0}' is already on the medication list")]
    Duplicate(String),
    #[error("Cannot add {name}: patient is allergic to {allergen}")]
    AllergyConflict { name: String, allergen: String },
}

pub struct RecordStore {
    record: PatientRecord,
}

impl RecordStore {
    pub fn new(record: PatientRecord) -> Self {
        Self { record }
    }

    /// Clone of the whole record; mutations are never observable through
    /// a previously returned value.
    pub fn context(&self) -> PatientRecord {
        self.record.clone()
    }

    pub fn add_medication(&mut self, input: MedicationInput) -> Result<Medication, RecordError> {
        let mut missing = Vec::new();
        let name = required(&input.name, "name", &mut missing);
        let dose = required(&input.dose, "dose", &mut missing);
        let frequency = required(&input.frequency, "frequency", &mut missing);
        if !missing.is_empty() {
            return Err(RecordError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if let Some(allergen) = self.conflicting_allergen(&name) {
            return Err(RecordError::AllergyConflict { name, allergen });
        }
        if self.medication_by_name(&name).is_some() {
            return Err(RecordError::Duplicate(name));
        }

        let medication = Medication {
            id: format!("med-{}", Uuid::new_v4()),
            name,
            dose,
            frequency,
            indication: input
                .indication
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_INDICATION.into()),
            start_date: Local::now().date_naive(),
        };
        self.record.medications.push(medication.clone());
        Ok(medication)
    }

    /// Field-by-field merge. The returned message enumerates every field
    /// whose value actually changed.
    pub fn edit_medication(
        &mut self,
        med_ref: &str,
        updates: MedicationUpdate,
    ) -> Result<(Medication, String), RecordError> {
        if updates.is_empty() {
            return Err(RecordError::Validation(
                "updates must include at least one field".into(),
            ));
        }

        let index = self
            .record
            .medications
            .iter()
            .position(|med| matches_ref(med, med_ref))
            .ok_or_else(|| RecordError::NotFound(med_ref.to_string()))?;

        if let Some(new_name) = updates.name.as_deref() {
            let collides = self
                .record
                .medications
                .iter()
                .enumerate()
                .any(|(other, med)| other != index && med.name.eq_ignore_ascii_case(new_name));
            if collides {
                return Err(RecordError::Duplicate(new_name.to_string()));
            }
        }

        let medication = &mut self.record.medications[index];

        let mut changes = Vec::new();
        apply_field(&mut medication.name, updates.name, "name", &mut changes);
        apply_field(&mut medication.dose, updates.dose, "dose", &mut changes);
        apply_field(
            &mut medication.frequency,
            updates.frequency,
            "frequency",
            &mut changes,
        );
        apply_field(
            &mut medication.indication,
            updates.indication,
            "indication",
            &mut changes,
        );

        let message = if changes.is_empty() {
            format!("No fields changed on {}", medication.name)
        } else {
            changes.join("; ")
        };
        Ok((medication.clone(), message))
    }

    pub fn discontinue_medication(&mut self, med_ref: &str) -> Result<Medication, RecordError> {
        let index = self
            .record
            .medications
            .iter()
            .position(|med| matches_ref(med, med_ref))
            .ok_or_else(|| RecordError::NotFound(med_ref.to_string()))?;
        Ok(self.record.medications.remove(index))
    }

    pub fn add_allergy(&mut self, input: AllergyInput) -> Result<Allergy, RecordError> {
        let allergen = input
            .allergen
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| RecordError::Validation("missing required field(s): allergen".into()))?
            .to_string();

        let allergy = Allergy {
            id: format!("allergy-{}", Uuid::new_v4()),
            allergen,
            reaction: input
                .reaction
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REACTION.into()),
            severity: input
                .severity
                .as_deref()
                .map(Severity::parse)
                .unwrap_or_default(),
        };
        self.record.allergies.push(allergy.clone());
        Ok(allergy)
    }

    fn medication_by_name(&self, name: &str) -> Option<&Medication> {
        self.record
            .medications
            .iter()
            .find(|med| med.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive substring match in either direction, plus the
    /// penicillin-class suffix rule: an allergy to any "-cillin" drug
    /// conflicts with the whole family (Amoxicillin vs Penicillin).
    fn conflicting_allergen(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        self.record
            .allergies
            .iter()
            .find(|allergy| {
                let allergen = allergy.allergen.to_lowercase();
                name.contains(&allergen)
                    || allergen.contains(&name)
                    || same_drug_family(&name, &allergen)
            })
            .map(|allergy| allergy.allergen.clone())
    }
}

fn same_drug_family(name: &str, allergen: &str) -> bool {
    const FAMILY_SUFFIXES: &[&str] = &["cillin"];
    FAMILY_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix) && allergen.ends_with(suffix))
}

fn matches_ref(medication: &Medication, med_ref: &str) -> bool {
    medication.id == med_ref || medication.name.eq_ignore_ascii_case(med_ref)
}

fn required(value: &Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => {
            missing.push(field);
            String::new()
        }
    }
}

fn apply_field(
    slot: &mut String,
    update: Option<String>,
    field: &'static str,
    changes: &mut Vec<String>,
) {
    if let Some(new_value) = update
        && *slot != new_value
    {
        changes.push(format!("{field} changed from {slot} to {new_value}"));
        *slot = new_value;
    }
}
