//! Maps wire method names onto record-store operations and normalizes
//! every result, success or failure, into a `ToolOutcome`.

use super::envelope::{ToolDescriptor, ToolOutcome};
use crate::application::store::{RecordError, RecordStore};
use crate::domain::record::{AllergyInput, MedicationInput, MedicationUpdate};
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

pub struct ToolRouter {
    store: Mutex<RecordStore>,
}

impl ToolRouter {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Exactly one store call per dispatch. Store errors become failure
    /// envelopes; nothing escapes as a panic, and unknown methods are a
    /// failure envelope too.
    pub fn dispatch(&self, method: &str, params: Value) -> ToolOutcome {
        let started = Instant::now();
        let outcome = self.route(method, params);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if outcome.success {
            info!(method, elapsed_ms, success = true, "Tool dispatched");
        } else {
            warn!(
                method,
                elapsed_ms,
                success = false,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Tool dispatch failed"
            );
        }
        outcome
    }

    fn route(&self, method: &str, params: Value) -> ToolOutcome {
        let mut store = self.store.lock().expect("record store lock");
        match method {
            "getContext" => {
                let record = store.context();
                match serde_json::to_value(&record) {
                    Ok(data) => ToolOutcome::ok(data, "Patient context retrieved"),
                    Err(err) => ToolOutcome::failure(err.to_string()),
                }
            }
            "addMedication" => match parse_params::<MedicationInput>(params) {
                Ok(input) => store
                    .add_medication(input)
                    .map(|med| {
                        let message = format!("Successfully added {} to the medication list", med.name);
                        outcome_with(med, message)
                    })
                    .unwrap_or_else(failure),
                Err(outcome) => outcome,
            },
            "editMedication" => match parse_edit_params(params) {
                Ok((med_ref, updates)) => store
                    .edit_medication(&med_ref, updates)
                    .map(|(med, message)| outcome_with(med, message))
                    .unwrap_or_else(failure),
                Err(outcome) => outcome,
            },
            "discontinueMedication" | "deleteMedication" => match parse_med_ref(params) {
                Ok(med_ref) => store
                    .discontinue_medication(&med_ref)
                    .map(|med| {
                        let message = format!("Successfully discontinued {}", med.name);
                        outcome_with(med, message)
                    })
                    .unwrap_or_else(failure),
                Err(outcome) => outcome,
            },
            "addAllergy" => match parse_params::<AllergyInput>(params) {
                Ok(input) => store
                    .add_allergy(input)
                    .map(|allergy| {
                        let message = format!("Successfully added allergy to {}", allergy.allergen);
                        outcome_with(allergy, message)
                    })
                    .unwrap_or_else(failure),
                Err(outcome) => outcome,
            },
            other => ToolOutcome::failure(format!("Unknown method: {other}")),
        }
    }

    /// Descriptors for every method this router answers, pushed to the
    /// agent side as the tool catalog.
    pub fn catalog(&self) -> Vec<ToolDescriptor> {
        vec![
            descriptor(
                "getContext",
                "Retrieve current patient medical information",
                json!({}),
            ),
            descriptor(
                "addMedication",
                "Add a new medication to the patient record, with allergy and duplicate checks",
                json!({
                    "name": "string - Name of the medication",
                    "dose": "string - Dosage amount (e.g., \"500mg\")",
                    "frequency": "string - How often to take (e.g., \"twice daily\")",
                    "indication": "string - Reason for prescribing (optional)",
                }),
            ),
            descriptor(
                "editMedication",
                "Edit fields of an existing medication",
                json!({
                    "medId": "string - Name or ID of the medication to edit",
                    "updates": "object - Any of name, dose, frequency, indication",
                }),
            ),
            descriptor(
                "discontinueMedication",
                "Discontinue an existing medication",
                json!({
                    "medId": "string - Name or ID of the medication to discontinue",
                }),
            ),
            descriptor(
                "deleteMedication",
                "Alias of discontinueMedication",
                json!({
                    "medId": "string - Name or ID of the medication to remove",
                }),
            ),
            descriptor(
                "addAllergy",
                "Add a new allergy to the patient record",
                json!({
                    "allergen": "string - The substance the patient is allergic to",
                    "reaction": "string - The type of reaction experienced (optional)",
                    "severity": "string - Mild, Moderate, or Severe (optional)",
                }),
            ),
        ]
    }
}

fn descriptor(name: &str, description: &str, parameters: Value) -> ToolDescriptor {
    ToolDescriptor {
        name: name.into(),
        description: description.into(),
        parameters,
    }
}

fn outcome_with<T: serde::Serialize>(data: T, message: String) -> ToolOutcome {
    match serde_json::to_value(&data) {
        Ok(value) => ToolOutcome::ok(value, message),
        Err(err) => ToolOutcome::failure(err.to_string()),
    }
}

fn failure(err: RecordError) -> ToolOutcome {
    ToolOutcome::failure(err.to_string())
}

fn parse_params<T: serde::de::DeserializeOwned + Default>(params: Value) -> Result<T, ToolOutcome> {
    match params {
        Value::Null => Ok(T::default()),
        other => serde_json::from_value(other)
            .map_err(|err| ToolOutcome::failure(format!("invalid parameters: {err}"))),
    }
}

/// `medId` arrives either as a bare string (the mini-language fallback)
/// or wrapped in an object.
fn parse_med_ref(params: Value) -> Result<String, ToolOutcome> {
    match params {
        Value::String(med_ref) if !med_ref.trim().is_empty() => Ok(med_ref.trim().to_string()),
        Value::Object(map) => match map.get("medId").and_then(Value::as_str) {
            Some(med_ref) if !med_ref.trim().is_empty() => Ok(med_ref.trim().to_string()),
            _ => Err(ToolOutcome::failure(
                "missing required field(s): medId",
            )),
        },
        _ => Err(ToolOutcome::failure("missing required field(s): medId")),
    }
}

fn parse_edit_params(params: Value) -> Result<(String, MedicationUpdate), ToolOutcome> {
    let Value::Object(map) = params else {
        return Err(ToolOutcome::failure(
            "editMedication expects an object with medId and updates",
        ));
    };
    let med_ref = map
        .get("medId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolOutcome::failure("missing required field(s): medId"))?
        .to_string();
    let updates = map.get("updates").cloned().ok_or_else(|| {
        ToolOutcome::failure("missing required field(s): updates")
    })?;
    let updates: MedicationUpdate = serde_json::from_value(updates)
        .map_err(|err| ToolOutcome::failure(format!("invalid updates: {err}")))?;
    Ok((med_ref, updates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::PatientRecord;

    fn router() -> ToolRouter {
        ToolRouter::new(RecordStore::new(PatientRecord::demo()))
    }

    #[test]
    fn unknown_method_is_a_failure_envelope() {
        let outcome = router().dispatch("frobnicate", Value::Null);
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unknown method: frobnicate")
        );
    }

    #[test]
    fn get_context_returns_deep_copy_data() {
        let router = router();
        let outcome = router.dispatch("getContext", Value::Null);
        assert!(outcome.success);
        let data = outcome.data.expect("context data");
        assert_eq!(data["patientId"], "PAT-12345");
        assert_eq!(data["medications"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn add_medication_success_envelope_matches_wire_shape() {
        let router = router();
        let outcome = router.dispatch(
            "addMedication",
            json!({"name": "Aspirin", "dose": "81mg", "frequency": "once daily"}),
        );
        assert!(outcome.success);
        let data = outcome.data.expect("medication data");
        assert_eq!(data["name"], "Aspirin");
        assert_eq!(data["dose"], "81mg");
        assert_eq!(data["frequency"], "once daily");
        assert_eq!(data["indication"], "Not specified");
        assert_eq!(
            outcome.message.as_deref(),
            Some("Successfully added Aspirin to the medication list")
        );
    }

    #[test]
    fn allergy_conflict_surfaces_store_error_text() {
        let router = router();
        let outcome = router.dispatch(
            "addMedication",
            json!({"name": "Amoxicillin", "dose": "500mg", "frequency": "twice daily"}),
        );
        assert!(!outcome.success);
        assert!(
            outcome
                .error
                .expect("error text")
                .contains("allergic to Penicillin")
        );
    }

    #[test]
    fn discontinue_accepts_bare_string_params() {
        let router = router();
        let outcome = router.dispatch("discontinueMedication", json!("Lisinopril"));
        assert!(outcome.success);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Successfully discontinued Lisinopril")
        );

        let outcome = router.dispatch("discontinueMedication", json!("Lisinopril"));
        assert!(!outcome.success);
        assert!(outcome.error.expect("error text").contains("not found"));
    }

    #[test]
    fn delete_is_an_alias_for_discontinue() {
        let router = router();
        let outcome = router.dispatch("deleteMedication", json!({"medId": "med-2"}));
        assert!(outcome.success);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Successfully discontinued Metformin")
        );
    }

    #[test]
    fn edit_reports_field_changes() {
        let router = router();
        let outcome = router.dispatch(
            "editMedication",
            json!({"medId": "Metformin", "updates": {"dose": "1000mg"}}),
        );
        assert!(outcome.success);
        assert!(
            outcome
                .message
                .expect("change message")
                .contains("dose changed from 500mg to 1000mg")
        );
    }

    #[test]
    fn edit_with_unknown_update_field_fails() {
        let router = router();
        let outcome = router.dispatch(
            "editMedication",
            json!({"medId": "Metformin", "updates": {"route": "oral"}}),
        );
        assert!(!outcome.success);
        assert!(outcome.error.expect("error text").contains("invalid updates"));
    }

    #[test]
    fn catalog_lists_every_routed_method() {
        let names: Vec<String> = router()
            .catalog()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        for method in [
            "getContext",
            "addMedication",
            "editMedication",
            "discontinueMedication",
            "deleteMedication",
            "addAllergy",
        ] {
            assert!(names.iter().any(|name| name == method), "{method} missing");
        }
    }
}
