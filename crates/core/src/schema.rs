use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::TaskType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub products: Vec<Product>,
    pub total_found: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Success,
    Failed,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub field_name: String,
    pub field_type: String,
    pub field_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormResult {
    pub form_url: String,
    pub fields_filled: Vec<FormField>,
    pub submission_status: SubmissionStatus,
    pub message: String,
}

/// Which structured shape the agent is asked to conform its result to.
/// Exactly one variant is active per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    SearchResults,
    FormResult,
    /// General tasks carry no structured schema; the agent answers in
    /// free text.
    FreeText,
}

impl OutputSchema {
    pub fn for_task(task_type: TaskType) -> Self {
        match task_type {
            TaskType::Search => OutputSchema::SearchResults,
            TaskType::FormFill => OutputSchema::FormResult,
            TaskType::General => OutputSchema::FreeText,
        }
    }

    /// JSON Schema sent to the agent service, None for free-text tasks.
    pub fn json_schema(&self) -> Option<Value> {
        let schema = match self {
            OutputSchema::SearchResults => schema_for!(SearchResults),
            OutputSchema::FormResult => schema_for!(FormResult),
            OutputSchema::FreeText => return None,
        };
        serde_json::to_value(schema).ok()
    }
}

/// Result returned across the capability boundary. The agent is expected,
/// not guaranteed, to honor the requested schema, so anything that does not
/// parse falls back to opaque text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentResult {
    Search(SearchResults),
    Form(FormResult),
    Text(String),
}

impl AgentResult {
    /// Interpret a raw agent payload against the schema the task asked for.
    pub fn from_value(schema: OutputSchema, value: Value) -> Self {
        match schema {
            OutputSchema::SearchResults => {
                if let Ok(results) = serde_json::from_value::<SearchResults>(value.clone()) {
                    return AgentResult::Search(results);
                }
                AgentResult::Text(value_as_text(value))
            }
            OutputSchema::FormResult => {
                if let Ok(result) = serde_json::from_value::<FormResult>(value.clone()) {
                    return AgentResult::Form(result);
                }
                AgentResult::Text(value_as_text(value))
            }
            OutputSchema::FreeText => AgentResult::Text(value_as_text(value)),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn value_as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
