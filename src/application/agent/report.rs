//! Turns tool outcomes into the chat-visible confirmations, one shape
//! per method.

use crate::application::tooling::ToolOutcome;
use crate::domain::record::{Allergy, Medication, PatientRecord};

pub fn describe_outcome(method: &str, outcome: &ToolOutcome) -> String {
    if !outcome.success {
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        return format!("I'm sorry, {method} did not complete: {error}");
    }

    let data = outcome.data.clone().unwrap_or_default();
    match method {
        "getContext" => serde_json::from_value::<PatientRecord>(data)
            .map(|record| summarize_record(&record))
            .unwrap_or_else(|_| fallback_message(method, outcome)),
        "addMedication" => serde_json::from_value::<Medication>(data)
            .map(|med| {
                format!(
                    "Added {} {} ({}) for {}. Record id {}.",
                    med.name, med.dose, med.frequency, med.indication, med.id
                )
            })
            .unwrap_or_else(|_| fallback_message(method, outcome)),
        "editMedication" => serde_json::from_value::<Medication>(data)
            .map(|med| {
                let changes = outcome.message.as_deref().unwrap_or("updated");
                format!("Updated {}: {changes}.", med.name)
            })
            .unwrap_or_else(|_| fallback_message(method, outcome)),
        "discontinueMedication" | "deleteMedication" => serde_json::from_value::<Medication>(data)
            .map(|med| format!("Removed {} from the medication list.", med.name))
            .unwrap_or_else(|_| fallback_message(method, outcome)),
        "addAllergy" => serde_json::from_value::<Allergy>(data)
            .map(|allergy| {
                format!(
                    "Recorded allergy to {}: reaction {}, severity {}.",
                    allergy.allergen,
                    allergy.reaction,
                    allergy.severity.as_str()
                )
            })
            .unwrap_or_else(|_| fallback_message(method, outcome)),
        _ => fallback_message(method, outcome),
    }
}

fn fallback_message(method: &str, outcome: &ToolOutcome) -> String {
    outcome
        .message
        .clone()
        .unwrap_or_else(|| format!("{method} completed."))
}

fn summarize_record(record: &PatientRecord) -> String {
    let mut lines = vec![format!(
        "Current record for {} (age {}), {} medication(s) and {} allergy(ies) on file.",
        record.name,
        record.age,
        record.medications.len(),
        record.allergies.len()
    )];
    if !record.medications.is_empty() {
        lines.push("Medications:".into());
        for med in &record.medications {
            lines.push(format!(
                "  - {} {} ({}) for {}",
                med.name, med.dose, med.frequency, med.indication
            ));
        }
    }
    if !record.allergies.is_empty() {
        lines.push("Allergies:".into());
        for allergy in &record.allergies {
            lines.push(format!(
                "  - {} ({}, {})",
                allergy.allergen,
                allergy.reaction,
                allergy.severity.as_str()
            ));
        }
    }
    if !record.conditions.is_empty() {
        lines.push(format!("Conditions: {}", record.conditions.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_summary_enumerates_with_counts() {
        let record = PatientRecord::demo();
        let outcome = ToolOutcome::ok(serde_json::to_value(&record).expect("encodes"), "ok");
        let summary = describe_outcome("getContext", &outcome);
        assert!(summary.contains("John Doe"));
        assert!(summary.contains("2 medication(s)"));
        assert!(summary.contains("1 allergy(ies)"));
        assert!(summary.contains("Lisinopril 10mg"));
        assert!(summary.contains("Penicillin"));
        assert!(summary.contains("Hyperlipidemia"));
    }

    #[test]
    fn failure_apologizes_and_names_the_method() {
        let outcome = ToolOutcome::failure("Medication with ID/name 'Nope' not found");
        let text = describe_outcome("discontinueMedication", &outcome);
        assert!(text.contains("I'm sorry"));
        assert!(text.contains("discontinueMedication"));
        assert!(text.contains("not found"));
    }

    #[test]
    fn addition_confirms_all_fields_and_id() {
        let outcome = ToolOutcome::ok(
            json!({
                "id": "med-42",
                "name": "Aspirin",
                "dose": "81mg",
                "frequency": "once daily",
                "indication": "Not specified",
                "startDate": "2026-08-07",
            }),
            "Successfully added Aspirin to the medication list",
        );
        let text = describe_outcome("addMedication", &outcome);
        assert!(text.contains("Aspirin 81mg"));
        assert!(text.contains("once daily"));
        assert!(text.contains("med-42"));
    }

    #[test]
    fn allergy_confirmation_includes_severity() {
        let outcome = ToolOutcome::ok(
            json!({
                "id": "allergy-9",
                "allergen": "Latex",
                "reaction": "Contact dermatitis",
                "severity": "Moderate",
            }),
            "Successfully added allergy to Latex",
        );
        let text = describe_outcome("addAllergy", &outcome);
        assert!(text.contains("Latex"));
        assert!(text.contains("Moderate"));
    }

    #[test]
    fn unrecognized_data_falls_back_to_outcome_message() {
        let outcome = ToolOutcome::ok(json!({"odd": true}), "Something happened");
        assert_eq!(
            describe_outcome("addMedication", &outcome),
            "Something happened"
        );
    }
}
