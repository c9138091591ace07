use serde::Serialize;
use serde_json::Value;

use crate::task::TaskType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Status,
    Action,
    Result,
    Error,
}

/// One message sent to a streaming client. Events for a task cycle are
/// strictly ordered; an error event ends the cycle in place of the result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub timestamp: f64,
}

impl StreamEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            message: None,
            action: None,
            data: None,
            task_type: None,
            timestamp: now_secs(),
        }
    }

    pub fn status(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::new(EventKind::Status)
        }
    }

    pub fn action(action: &str, message: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            message: Some(message.to_string()),
            ..Self::new(EventKind::Action)
        }
    }

    pub fn result(data: Value, task_type: TaskType) -> Self {
        Self {
            data: Some(data),
            task_type: Some(task_type.as_str().to_string()),
            ..Self::new(EventKind::Result)
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::new(EventKind::Error)
        }
    }
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_event_shape() {
        let event = StreamEvent::status("Starting browser automation...");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "status");
        assert_eq!(value["message"], "Starting browser automation...");
        assert!(value.get("action").is_none());
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_result_event_carries_task_type() {
        let event = StreamEvent::result(json!({"totalFound": 0}), TaskType::Search);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "result");
        assert_eq!(value["taskType"], "search");
        assert_eq!(value["data"]["totalFound"], 0);
    }

    #[test]
    fn test_action_event_shape() {
        let event = StreamEvent::action("navigate", "Opening browser...");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "action");
        assert_eq!(value["action"], "navigate");
    }
}
