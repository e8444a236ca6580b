//! Deterministic local stand-in for the completion endpoint. Keyword
//! rules over the last user utterance produce the same TOOL_CALL blocks
//! a live model would, so the whole loop keeps working offline.

use super::traits::ModelProvider;
use super::types::{CompletionRequest, ModelError};
use crate::application::agent::parser;
use crate::domain::types::MessageRole;
use async_trait::async_trait;
use serde_json::json;

/// keyword, canonical name, default dose, default frequency, indication
const KNOWN_MEDICATIONS: &[(&str, &str, &str, &str, &str)] = &[
    ("ibuprofen", "Ibuprofen", "400mg", "every 6-8 hours as needed", "Pain and inflammation"),
    ("advil", "Ibuprofen", "400mg", "every 6-8 hours as needed", "Pain and inflammation"),
    ("acetaminophen", "Acetaminophen", "500mg", "every 6 hours as needed", "Pain and fever"),
    ("tylenol", "Acetaminophen", "500mg", "every 6 hours as needed", "Pain and fever"),
    ("paracetamol", "Acetaminophen", "500mg", "every 6 hours as needed", "Pain and fever"),
    ("amoxicillin", "Amoxicillin", "500mg", "three times daily", "Bacterial infection"),
    ("azithromycin", "Azithromycin", "250mg", "once daily", "Bacterial infection"),
    ("lisinopril", "Lisinopril", "10mg", "once daily", "Hypertension"),
    ("amlodipine", "Amlodipine", "5mg", "once daily", "Hypertension"),
    ("metformin", "Metformin", "500mg", "twice daily", "Type 2 diabetes"),
    ("aspirin", "Aspirin", "81mg", "once daily", "Cardioprotection"),
];

/// keyword, canonical allergen, typical reaction, typical severity
const KNOWN_ALLERGENS: &[(&str, &str, &str, &str)] = &[
    ("penicillin", "Penicillin", "Hives and skin rash", "Severe"),
    ("sulfa", "Sulfa drugs", "Skin rash", "Moderate"),
    ("aspirin", "Aspirin", "Respiratory issues", "Severe"),
    ("ibuprofen", "Ibuprofen", "Stomach upset and rash", "Moderate"),
    ("codeine", "Codeine", "Nausea and dizziness", "Moderate"),
    ("latex", "Latex", "Contact dermatitis", "Moderate"),
];

const ADD_VERBS: &[&str] = &["add", "prescribe", "start", "give", "begin"];
const REMOVE_VERBS: &[&str] = &["stop", "discontinue", "remove", "delete", "cancel"];
const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "some", "new", "to", "on", "of", "for", "patient", "patient's", "them",
    "their", "her", "him", "his", "please",
];

#[derive(Clone, Default)]
pub struct SimulationClient;

#[async_trait]
impl ModelProvider for SimulationClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default();
        Ok(respond(last_user))
    }
}

fn respond(message: &str) -> String {
    let msg = message.to_lowercase();

    // Tool-result feedback must never trigger another call, or the loop
    // would not converge.
    if msg.contains("tool_result") {
        return summarize_result(&msg);
    }

    if ["medications", "allergies", "patient", "record"]
        .iter()
        .any(|keyword| msg.contains(keyword))
    {
        return format!(
            "Let me check the patient's information.\n\n{}",
            parser::render_tool_call("getContext", &json!({}))
        );
    }

    if ["allergy", "allergic", "reaction"]
        .iter()
        .any(|keyword| msg.contains(keyword))
    {
        return allergy_response(&msg);
    }

    if REMOVE_VERBS.iter().any(|verb| msg.contains(verb)) {
        return discontinue_response(&msg);
    }

    if ADD_VERBS.iter().any(|verb| msg.contains(verb)) {
        return medication_response(&msg);
    }

    format!(
        "I'll check the patient's current information to assist you better.\n\n{}",
        parser::render_tool_call("getContext", &json!({}))
    )
}

fn summarize_result(msg: &str) -> String {
    if msg.contains("\"success\":false") {
        "That last step didn't go through: the record system rejected it. Want me to try something else?"
            .to_string()
    } else {
        "All set. The chart reflects that change now. Anything else for this patient?".to_string()
    }
}

fn medication_response(msg: &str) -> String {
    let known = KNOWN_MEDICATIONS
        .iter()
        .find(|(keyword, ..)| msg.contains(keyword));

    let (name, mut dose, mut frequency, indication) = match known {
        Some((_, name, dose, frequency, indication)) => (
            (*name).to_string(),
            (*dose).to_string(),
            (*frequency).to_string(),
            (*indication).to_string(),
        ),
        None => match token_after(msg, ADD_VERBS) {
            Some(name) => (
                capitalize(&name),
                "500mg".to_string(),
                "twice daily".to_string(),
                "As prescribed by physician".to_string(),
            ),
            None => {
                return "I'd be happy to help add a medication. Which medication, and for what condition?"
                    .to_string();
            }
        },
    };

    if let Some(explicit) = extract_dose(msg) {
        dose = explicit;
    }
    if let Some(explicit) = extract_frequency(msg) {
        frequency = explicit;
    }

    format!(
        "I'll add {name} to the patient's medication list.\n\n{}",
        parser::render_tool_call(
            "addMedication",
            &json!({
                "name": name,
                "dose": dose,
                "frequency": frequency,
                "indication": indication,
            })
        )
    )
}

fn discontinue_response(msg: &str) -> String {
    let name = KNOWN_MEDICATIONS
        .iter()
        .find(|(keyword, ..)| msg.contains(keyword))
        .map(|(_, name, ..)| (*name).to_string())
        .or_else(|| token_after(msg, REMOVE_VERBS).map(|token| capitalize(&token)));

    match name {
        Some(name) => format!(
            "I'll discontinue {name} from the patient's medication list.\n\n{}",
            parser::render_tool_call("discontinueMedication", &json!(name))
        ),
        None => "I'd be happy to help discontinue a medication. Which one should I stop?"
            .to_string(),
    }
}

fn allergy_response(msg: &str) -> String {
    let known = KNOWN_ALLERGENS
        .iter()
        .find(|(keyword, ..)| msg.contains(keyword));

    let (allergen, mut reaction, mut severity) = match known {
        Some((_, allergen, reaction, severity)) => (
            (*allergen).to_string(),
            (*reaction).to_string(),
            (*severity).to_string(),
        ),
        None => match token_after(msg, &["to"]) {
            Some(allergen) => (
                capitalize(&allergen),
                "Unknown reaction".to_string(),
                "Moderate".to_string(),
            ),
            None => {
                return "I'd be happy to add an allergy. What is the patient allergic to?"
                    .to_string();
            }
        },
    };

    for (keyword, text) in [
        ("hives", "Hives"),
        ("rash", "Skin rash"),
        ("swelling", "Swelling"),
        ("breathing", "Difficulty breathing"),
        ("nausea", "Nausea"),
    ] {
        if msg.contains(keyword) {
            reaction = text.to_string();
            break;
        }
    }

    if msg.contains("severe") || msg.contains("serious") {
        severity = "Severe".to_string();
    } else if msg.contains("mild") || msg.contains("minor") {
        severity = "Mild".to_string();
    } else if msg.contains("moderate") {
        severity = "Moderate".to_string();
    }

    format!(
        "I'll add {allergen} allergy to the patient's profile.\n\n{}",
        parser::render_tool_call(
            "addAllergy",
            &json!({
                "allergen": allergen,
                "reaction": reaction,
                "severity": severity,
            })
        )
    )
}

/// First non-filler word following any of the trigger words.
fn token_after(msg: &str, triggers: &[&str]) -> Option<String> {
    let tokens: Vec<String> = msg
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect();
    let position = tokens
        .iter()
        .position(|token| triggers.contains(&token.as_str()))?;
    tokens[position + 1..]
        .iter()
        .find(|token| {
            !FILLER_WORDS.contains(&token.as_str()) && token.chars().any(char::is_alphabetic)
        })
        .cloned()
}

fn extract_dose(msg: &str) -> Option<String> {
    msg.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|token| {
            token.len() > 2
                && token.ends_with("mg")
                && token[..token.len() - 2].chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
}

fn extract_frequency(msg: &str) -> Option<String> {
    if msg.contains("once daily") || msg.contains("once a day") {
        return Some("once daily".to_string());
    }
    if msg.contains("twice daily") || msg.contains("twice a day") {
        return Some("twice daily".to_string());
    }
    if msg.contains("three times") {
        return Some("three times daily".to_string());
    }
    let tokens: Vec<&str> = msg.split_whitespace().collect();
    for window in tokens.windows(3) {
        if window[0] == "every" && window[2].starts_with("hour") {
            if let Ok(hours) = window[1].parse::<u32>() {
                return Some(format!("every {hours} hours"));
            }
        }
    }
    None
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
