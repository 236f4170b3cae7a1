//! Agent directory records and response payloads
//!
//! The Foundry API evolves faster than this server, so nested metadata is
//! parsed leniently: a field with an unexpected shape becomes `None` instead
//! of failing the whole record.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote agent as reported by the directory listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentRecord {
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub versions: Option<AgentVersions>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentVersions {
    #[serde(default, deserialize_with = "lenient")]
    pub latest: Option<AgentVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentVersion {
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub definition: Option<AgentDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentDefinition {
    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub instructions: Option<String>,
}

/// Where a tool description was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource<'a> {
    Instructions(&'a str),
    Description(&'a str),
    Default,
}

impl AgentRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            description: None,
            versions: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let definition = AgentDefinition {
            instructions: Some(instructions.into()),
            ..AgentDefinition::default()
        };
        self.versions = Some(AgentVersions {
            latest: Some(AgentVersion {
                version: None,
                definition: Some(definition),
            }),
        });
        self
    }

    pub fn latest_definition(&self) -> Option<&AgentDefinition> {
        self.versions
            .as_ref()
            .and_then(|versions| versions.latest.as_ref())
            .and_then(|latest| latest.definition.as_ref())
    }

    pub fn description_source(&self) -> DescriptionSource<'_> {
        let instructions = self
            .latest_definition()
            .and_then(|definition| definition.instructions.as_deref());
        // Whitespace-only text would advertise a blank tool description.
        match (instructions, self.description.as_deref()) {
            (Some(text), _) if !text.trim().is_empty() => DescriptionSource::Instructions(text),
            (_, Some(text)) if !text.trim().is_empty() => DescriptionSource::Description(text),
            _ => DescriptionSource::Default,
        }
    }

    /// Description advertised on the agent's tool.
    pub fn tool_description(&self) -> String {
        match self.description_source() {
            DescriptionSource::Instructions(text) | DescriptionSource::Description(text) => {
                text.to_string()
            }
            DescriptionSource::Default => default_description(&self.name),
        }
    }
}

pub fn default_description(agent_name: &str) -> String {
    format!("Query the {agent_name} agent")
}

/// Payload returned by the responses endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AgentResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub output: Vec<OutputItem>,
}

impl AgentResponse {
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }

    /// Human readable reason for a `failed` status.
    pub fn failure_message(&self) -> String {
        let detail = match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(Value::Object(fields)) => fields
                .get("message")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .or_else(|| Some(Value::Object(fields.clone()).to_string())),
            Some(other) => Some(other.to_string()),
        };
        match detail {
            Some(detail) => format!("Agent response failed: {detail}"),
            None => "Agent response failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputItem {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<Vec<ContentPart>>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

/// Identity captured by value when a tool is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBinding {
    pub agent_name: String,
    pub description: String,
}

impl AgentBinding {
    pub fn new(agent_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            description: description.into(),
        }
    }
}

/// Local projection of a remote agent that currently has a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTool {
    pub agent_name: String,
    pub description: String,
    pub identifier: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_latest_instructions() {
        let record: AgentRecord = serde_json::from_value(json!({
            "name": "Sales Bot",
            "description": "plain description",
            "versions": {"latest": {"version": "3", "definition": {"kind": "prompt", "instructions": "Answer sales questions"}}}
        }))
        .expect("record parses");

        assert_eq!(
            record.description_source(),
            DescriptionSource::Instructions("Answer sales questions")
        );
        assert_eq!(record.tool_description(), "Answer sales questions");
    }

    #[test]
    fn falls_back_to_description_when_instructions_blank() {
        let record: AgentRecord = serde_json::from_value(json!({
            "name": "Sales Bot",
            "description": "plain description",
            "versions": {"latest": {"definition": {"instructions": ""}}}
        }))
        .expect("record parses");

        assert_eq!(record.tool_description(), "plain description");
    }

    #[test]
    fn whitespace_only_text_is_treated_as_missing() {
        let record = AgentRecord::new("Sales Bot")
            .with_description(" \t ")
            .with_instructions("   ");

        assert_eq!(record.description_source(), DescriptionSource::Default);
        assert_eq!(record.tool_description(), "Query the Sales Bot agent");
    }

    #[test]
    fn malformed_versions_degrade_to_default() {
        let record: AgentRecord = serde_json::from_value(json!({
            "name": "Ops Agent",
            "versions": {"latest": "not-an-object"},
            "description": 42
        }))
        .expect("record parses despite malformed metadata");

        assert!(record.latest_definition().is_none());
        assert_eq!(record.description_source(), DescriptionSource::Default);
        assert_eq!(record.tool_description(), "Query the Ops Agent agent");
    }

    #[test]
    fn failure_message_uses_error_message_field() {
        let response: AgentResponse = serde_json::from_value(json!({
            "status": "failed",
            "error": {"code": "server_error", "message": "model overloaded"}
        }))
        .expect("response parses");

        assert!(response.is_failed());
        assert_eq!(
            response.failure_message(),
            "Agent response failed: model overloaded"
        );
        assert_eq!(
            AgentResponse::default().failure_message(),
            "Agent response failed"
        );
    }

    #[test]
    fn unexpected_output_items_are_skipped() {
        let response: AgentResponse = serde_json::from_value(json!({
            "output": [
                "garbage",
                {"type": "message", "content": [{"type": "output_text", "text": "hi"}]}
            ]
        }))
        .expect("response parses");

        assert_eq!(response.output.len(), 1);
        assert_eq!(response.output[0].kind.as_deref(), Some("message"));
    }
}
