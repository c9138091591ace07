use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use webpilot_core::{AgentConfig, AgentResult, Error, OutputSchema, Result};

use crate::BrowserAgent;

/// HTTP adapter for an external browser-agent service. A task runs inside a
/// session: opening one launches a browser, closing it releases the browser.
/// The session is closed on every exit path, including run failures.
pub struct HttpBrowserAgent {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    session_timeout: Duration,
}

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct RunResponse {
    result: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl HttpBrowserAgent {
    pub fn new(config: &AgentConfig) -> Self {
        let client = Client::builder().build().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client, using default");
            Client::new()
        });
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            session_timeout: Duration::from_secs(config.session_timeout_secs),
        }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    /// Body for the run call: task text plus the JSON Schema the agent
    /// should conform its output to, when the task has one.
    pub fn build_run_body(task: &str, schema: OutputSchema) -> Value {
        let mut body = json!({ "task": task });
        if let Some(output_schema) = schema.json_schema() {
            body["output_schema"] = output_schema;
        }
        body
    }

    async fn open_session(&self) -> Result<String> {
        let response = self
            .authorized(self.client.post(format!("{}/v1/sessions", self.api_base)))
            .timeout(self.session_timeout)
            .json(&json!({ "model": self.model }))
            .send()
            .await
            .map_err(|e| Error::Agent(format!("Failed to open agent session: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_detail(response).await;
            return Err(Error::Agent(format!(
                "Agent session open failed ({}): {}",
                status, detail
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("Invalid session response: {}", e)))?;
        debug!(session_id = %session.session_id, "Agent session opened");
        Ok(session.session_id)
    }

    /// No timeout here: real browser automation runs for an unbounded
    /// duration and the relay imposes none.
    async fn run_task(&self, session_id: &str, task: &str, schema: OutputSchema) -> Result<Value> {
        let body = Self::build_run_body(task, schema);
        let response = self
            .authorized(self.client.post(format!(
                "{}/v1/sessions/{}/run",
                self.api_base, session_id
            )))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("Agent run request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_detail(response).await;
            return Err(Error::Agent(format!("Task failed ({}): {}", status, detail)));
        }

        let run: RunResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("Invalid run response: {}", e)))?;
        Ok(run.result)
    }

    async fn close_session(&self, session_id: &str) {
        let result = self
            .authorized(self.client.delete(format!(
                "{}/v1/sessions/{}",
                self.api_base, session_id
            )))
            .timeout(self.session_timeout)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                debug!(session_id = %session_id, "Agent session closed");
            }
            Ok(response) => {
                warn!(session_id = %session_id, status = %response.status(), "Agent session close rejected");
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Agent session close failed");
            }
        }
    }
}

async fn read_detail(response: reqwest::Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(body) => body.detail,
        Err(_) if !raw.is_empty() => raw,
        Err(_) => "no detail".to_string(),
    }
}

#[async_trait]
impl BrowserAgent for HttpBrowserAgent {
    async fn execute(&self, task: &str, schema: OutputSchema) -> Result<AgentResult> {
        let session_id = self.open_session().await?;
        info!(session_id = %session_id, "Running browser task");

        // Capture the outcome first so the session is released on both paths.
        let outcome = self.run_task(&session_id, task, schema).await;
        self.close_session(&session_id).await;

        let value = outcome?;
        Ok(AgentResult::from_value(schema, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_body_includes_schema_for_search() {
        let body = HttpBrowserAgent::build_run_body("find mice", OutputSchema::SearchResults);
        assert_eq!(body["task"], "find mice");
        let schema = body["output_schema"].to_string();
        assert!(schema.contains("products"));
        assert!(schema.contains("totalFound"));
    }

    #[test]
    fn test_run_body_includes_schema_for_form() {
        let body = HttpBrowserAgent::build_run_body("signup", OutputSchema::FormResult);
        let schema = body["output_schema"].to_string();
        assert!(schema.contains("fieldsFilled"));
        assert!(schema.contains("submissionStatus"));
    }

    #[test]
    fn test_run_body_omits_schema_for_free_text() {
        let body = HttpBrowserAgent::build_run_body("open the news", OutputSchema::FreeText);
        assert!(body.get("output_schema").is_none());
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let config = AgentConfig {
            api_base: "http://agent:7788/".to_string(),
            ..AgentConfig::default()
        };
        let agent = HttpBrowserAgent::new(&config);
        assert_eq!(agent.api_base, "http://agent:7788");
    }
}
