//! Tolerant extraction of the completion text from whatever body shape
//! the endpoint returns. Strategies are tried in order; the first one
//! that yields a string wins. Upstream shape changes stay inside this
//! module.

use serde_json::Value;

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: &[Extractor] = &[
    choice_message_content,
    choice_text,
    top_text,
    top_response,
    top_completion,
    first_string_field,
];

pub fn first_text(body: &Value) -> Option<String> {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(body))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn choice_message_content(body: &Value) -> Option<String> {
    owned(
        body.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?,
    )
}

fn choice_text(body: &Value) -> Option<String> {
    owned(body.get("choices")?.get(0)?.get("text")?)
}

fn top_text(body: &Value) -> Option<String> {
    owned(body.get("text")?)
}

fn top_response(body: &Value) -> Option<String> {
    owned(body.get("response")?)
}

fn top_completion(body: &Value) -> Option<String> {
    owned(body.get("completion")?)
}

/// Last resort: the first string-valued field of the top-level object.
fn first_string_field(body: &Value) -> Option<String> {
    body.as_object()?
        .values()
        .find_map(|value| value.as_str())
        .map(str::to_string)
}

fn owned(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}
