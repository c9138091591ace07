use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use webpilot_agent::BrowserAgent;
use webpilot_core::{OutputSchema, StreamEvent, TaskDescriptor, TaskType};

/// Drives the task cycles of one streaming connection. Each inbound task is
/// processed to completion before the next is read: emit the fixed progress
/// sequence, await the agent exactly once, then finish with a result or a
/// single error event.
pub struct TaskSession {
    agent: Arc<dyn BrowserAgent>,
    events: mpsc::UnboundedSender<StreamEvent>,
}

impl TaskSession {
    pub fn new(agent: Arc<dyn BrowserAgent>, events: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { agent, events }
    }

    /// Run one task cycle. Send failures mean the client is gone; the cycle
    /// stops emitting but the in-flight agent call is never cancelled.
    pub async fn run(&self, descriptor: &TaskDescriptor) {
        let task_type = descriptor.task_type;
        info!(task_type = %task_type, "Task cycle started");

        if !self.emit(StreamEvent::status("Starting browser automation...")) {
            return;
        }
        if !self.emit(StreamEvent::status(&format!(
            "Analyzing {} task...",
            task_type
        ))) {
            return;
        }

        let schema = OutputSchema::for_task(task_type);
        let enhanced = descriptor.enhanced_task();

        if !self.emit(StreamEvent::action("navigate", navigate_message(task_type))) {
            return;
        }

        match self.agent.execute(&enhanced, schema).await {
            Ok(result) => {
                let (action, message) = completion_action(task_type);
                if !self.emit(StreamEvent::action(action, message)) {
                    return;
                }
                if !self.emit(StreamEvent::status("✅ Task completed successfully!")) {
                    return;
                }
                self.emit(StreamEvent::result(result.to_value(), task_type));
                info!(task_type = %task_type, "Task cycle completed");
            }
            Err(e) => {
                warn!(task_type = %task_type, error = %e, "Task cycle failed");
                self.emit(StreamEvent::error(&format!("Task failed: {}", e)));
            }
        }
    }

    /// Report a payload that could not be parsed into a task. The connection
    /// stays usable for the next message.
    pub fn reject(&self, reason: &str) {
        self.emit(StreamEvent::error(&format!("Invalid task payload: {}", reason)));
    }

    fn emit(&self, event: StreamEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

fn navigate_message(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::Search | TaskType::General => {
            "Opening browser and navigating to target site..."
        }
        TaskType::FormFill => "Opening browser and locating the form...",
    }
}

fn completion_action(task_type: TaskType) -> (&'static str, &'static str) {
    match task_type {
        TaskType::Search | TaskType::General => {
            ("extract", "Extracting and processing results...")
        }
        TaskType::FormFill => ("submit", "Submitting the form and verifying the outcome..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use webpilot_core::{
        AgentResult, Error, EventKind, Product, Result, SearchResults,
    };

    struct MockAgent {
        outcome: Mutex<Option<Result<AgentResult>>>,
        seen_tasks: Mutex<Vec<String>>,
        seen_schemas: Mutex<Vec<OutputSchema>>,
    }

    impl MockAgent {
        fn ok(result: AgentResult) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(Some(Ok(result))),
                seen_tasks: Mutex::new(Vec::new()),
                seen_schemas: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Mutex::new(Some(Err(Error::Agent(message.to_string())))),
                seen_tasks: Mutex::new(Vec::new()),
                seen_schemas: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl BrowserAgent for MockAgent {
        async fn execute(&self, task: &str, schema: OutputSchema) -> Result<AgentResult> {
            self.seen_tasks.lock().unwrap().push(task.to_string());
            self.seen_schemas.lock().unwrap().push(schema);
            self.outcome.lock().unwrap().take().expect("single use mock")
        }
    }

    fn search_result() -> AgentResult {
        AgentResult::Search(SearchResults {
            products: vec![Product {
                name: "Wireless Mouse".to_string(),
                price: "$24.99".to_string(),
                rating: Some("4.4".to_string()),
                url: "https://shop/mouse".to_string(),
                image: Some("https://img/mouse.jpg".to_string()),
            }],
            total_found: 1,
        })
    }

    async fn collect(
        mut rx: mpsc::UnboundedReceiver<StreamEvent>,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_search_task_event_order() {
        let agent = MockAgent::ok(search_result());
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TaskSession::new(agent.clone(), tx);

        let descriptor =
            TaskDescriptor::new("find wireless mice under $30", TaskType::Search);
        session.run(&descriptor).await;

        let events = collect(rx).await;
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Status,
                EventKind::Status,
                EventKind::Action,
                EventKind::Action,
                EventKind::Status,
                EventKind::Result,
            ]
        );
        assert_eq!(
            events[0].message.as_deref(),
            Some("Starting browser automation...")
        );
        assert_eq!(events[1].message.as_deref(), Some("Analyzing search task..."));
        assert_eq!(events[2].action.as_deref(), Some("navigate"));
        assert_eq!(events[3].action.as_deref(), Some("extract"));
        assert!(events[4].message.as_deref().unwrap().starts_with('✅'));
        assert_eq!(events[5].task_type.as_deref(), Some("search"));
        let data = events[5].data.as_ref().unwrap();
        assert_eq!(data["totalFound"], 1);
        assert_eq!(data["products"][0]["name"], "Wireless Mouse");

        // The agent saw the search schema and the augmented text.
        assert_eq!(
            agent.seen_schemas.lock().unwrap()[0],
            OutputSchema::SearchResults
        );
        assert!(agent.seen_tasks.lock().unwrap()[0].contains("find wireless mice"));
    }

    #[tokio::test]
    async fn test_form_task_uses_submit_action_and_template() {
        let agent = MockAgent::ok(AgentResult::Text("submitted".to_string()));
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TaskSession::new(agent.clone(), tx);

        session
            .run(&TaskDescriptor::new("signup on example.com", TaskType::FormFill))
            .await;

        let events = collect(rx).await;
        assert_eq!(
            events[1].message.as_deref(),
            Some("Analyzing form_fill task...")
        );
        assert_eq!(events[3].action.as_deref(), Some("submit"));
        assert_eq!(events[5].task_type.as_deref(), Some("form_fill"));

        let seen = agent.seen_tasks.lock().unwrap();
        assert!(seen[0].contains("test@example.com"));
        assert!(seen[0].contains("+91-XXXXXXXXXX"));
        assert_eq!(
            agent.seen_schemas.lock().unwrap()[0],
            OutputSchema::FormResult
        );
    }

    #[tokio::test]
    async fn test_failure_emits_single_error_and_nothing_after() {
        let agent = MockAgent::failing("browser crashed");
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TaskSession::new(agent, tx);

        session
            .run(&TaskDescriptor::new("find mice", TaskType::Search))
            .await;

        let events = collect(rx).await;
        let errors: Vec<&StreamEvent> = events
            .iter()
            .filter(|e| e.kind == EventKind::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .as_deref()
            .unwrap()
            .contains("browser crashed"));

        // The cycle short-circuits: no extract, no result after the error.
        assert_eq!(events.last().unwrap().kind, EventKind::Error);
        assert!(!events
            .iter()
            .any(|e| e.action.as_deref() == Some("extract")));
        assert!(!events.iter().any(|e| e.kind == EventKind::Result));
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_emission_quietly() {
        let agent = MockAgent::ok(search_result());
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let session = TaskSession::new(agent, tx);

        // Must not panic even though every send fails.
        session
            .run(&TaskDescriptor::new("find mice", TaskType::Search))
            .await;
    }

    #[tokio::test]
    async fn test_reject_emits_error_event() {
        let agent = MockAgent::ok(search_result());
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TaskSession::new(agent, tx);

        session.reject("missing field `task`");

        let events = collect(rx).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Error);
        assert!(events[0]
            .message
            .as_deref()
            .unwrap()
            .contains("missing field `task`"));
    }

    #[tokio::test]
    async fn test_general_task_runs_without_schema() {
        let agent = MockAgent::ok(AgentResult::Text("done".to_string()));
        let (tx, rx) = mpsc::unbounded_channel();
        let session = TaskSession::new(agent.clone(), tx);

        session
            .run(&TaskDescriptor::new("open the news", TaskType::General))
            .await;

        let events = collect(rx).await;
        assert_eq!(events.last().unwrap().kind, EventKind::Result);
        assert_eq!(events.last().unwrap().data.as_ref().unwrap(), "done");
        assert_eq!(
            agent.seen_schemas.lock().unwrap()[0],
            OutputSchema::FreeText
        );
    }
}
