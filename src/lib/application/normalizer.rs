//! Flattens agent responses into plain text

use crate::domain::types::AgentResponse;

pub const NO_RESPONSE: &str = "No response received from the agent.";
pub const NO_TEXT_RESPONSE: &str = "No text response received from the agent.";

/// Extracts the text of an agent response.
///
/// The pre-rendered `output_text` wins when present. Otherwise text parts of
/// every output item are concatenated, one line per part.
pub fn normalize_response(response: Option<&AgentResponse>) -> String {
    let Some(response) = response else {
        return NO_RESPONSE.to_string();
    };

    // Whitespace-only output_text counts as absent so output parts still apply.
    if let Some(text) = response.output_text.as_deref().filter(|t| !t.trim().is_empty()) {
        return finish(text);
    }

    let mut collected = String::new();
    for item in &response.output {
        if let Some(parts) = &item.content {
            for text in parts.iter().filter_map(|part| part.text.as_deref()) {
                collected.push_str(text);
                collected.push('\n');
            }
        } else if let Some(text) = &item.text {
            collected.push_str(text);
            collected.push('\n');
        }
    }

    finish(&collected)
}

fn finish(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        NO_TEXT_RESPONSE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AgentResponse {
        serde_json::from_value(value).expect("response parses")
    }

    #[test]
    fn absent_response_uses_sentinel() {
        assert_eq!(normalize_response(None), NO_RESPONSE);
    }

    #[test]
    fn output_text_is_trimmed() {
        let res = response(json!({"output_text": "  final answer \n"}));
        assert_eq!(normalize_response(Some(&res)), "final answer");
    }

    #[test]
    fn blank_output_text_falls_back_to_parts() {
        let res = response(json!({
            "output_text": "  \n",
            "output": [{"type": "message", "content": [{"text": "from parts"}]}]
        }));
        assert_eq!(normalize_response(Some(&res)), "from parts");

        let blank = response(json!({"output_text": "   "}));
        assert_eq!(normalize_response(Some(&blank)), NO_TEXT_RESPONSE);
    }

    #[test]
    fn falls_back_to_content_parts() {
        let res = response(json!({
            "output_text": "",
            "output": [{
                "type": "message",
                "content": [
                    {"type": "output_text", "text": "Hello"},
                    {"type": "output_text", "text": "World"}
                ]
            }]
        }));
        assert_eq!(normalize_response(Some(&res)), "Hello\nWorld");
    }

    #[test]
    fn accumulates_across_items_and_direct_text() {
        let res = response(json!({
            "output": [
                {"type": "reasoning", "text": "step one"},
                {"type": "message", "content": [{"type": "refusal"}, {"text": "answer"}]},
                {"type": "message", "content": []}
            ]
        }));
        assert_eq!(normalize_response(Some(&res)), "step one\nanswer");
    }

    #[test]
    fn content_shadows_direct_text() {
        let res = response(json!({
            "output": [{"content": [{"text": "from parts"}], "text": "ignored"}]
        }));
        assert_eq!(normalize_response(Some(&res)), "from parts");
    }

    #[test]
    fn no_extractable_text_uses_sentinel() {
        let res = response(json!({"output": [{"type": "function_call"}]}));
        assert_eq!(normalize_response(Some(&res)), NO_TEXT_RESPONSE);
        assert_eq!(
            normalize_response(Some(&AgentResponse::default())),
            NO_TEXT_RESPONSE
        );
    }
}
