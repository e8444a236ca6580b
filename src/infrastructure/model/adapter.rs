//! Flattens a role-tagged conversation into the single prompt string the
//! completion endpoint expects.

use crate::domain::types::{ChatMessage, MessageRole};

const USER_PREFIX: &str = "Healthcare Provider:";
const ASSISTANT_PREFIX: &str = "Assistant:";

pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        match message.role {
            MessageRole::System => {
                prompt.push_str(&message.content);
                prompt.push_str("\n\n");
            }
            MessageRole::User => {
                prompt.push_str(&format!("{USER_PREFIX} {}\n\n", message.content));
            }
            MessageRole::Assistant => {
                prompt.push_str(&format!("{ASSISTANT_PREFIX} {}\n\n", message.content));
            }
        }
    }
    // Cue the model to continue as the assistant.
    prompt.push_str(ASSISTANT_PREFIX);
    prompt
}

/// Models echoing the cue back get it shaved off again.
pub fn trim_assistant_cue(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix(ASSISTANT_PREFIX)
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_roles_with_prefixes_and_final_cue() {
        let messages = vec![
            ChatMessage::new(MessageRole::System, "Be brief."),
            ChatMessage::new(MessageRole::User, "Hello"),
            ChatMessage::new(MessageRole::Assistant, "Hi there"),
        ];
        let prompt = flatten_messages(&messages);
        assert!(prompt.starts_with("Be brief.\n\n"));
        assert!(prompt.contains("Healthcare Provider: Hello"));
        assert!(prompt.contains("Assistant: Hi there"));
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn trims_an_echoed_cue() {
        assert_eq!(trim_assistant_cue("Assistant: All done."), "All done.");
        assert_eq!(trim_assistant_cue("  Plain answer.  "), "Plain answer.");
    }
}
