pub mod client;

use async_trait::async_trait;
use webpilot_core::{AgentResult, OutputSchema, Result};

/// The execution capability consumed by the relay: one task text in, one
/// structured (or free-text) result out. Planning, browser control and DOM
/// understanding all live behind this boundary.
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    async fn execute(&self, task: &str, schema: OutputSchema) -> Result<AgentResult>;
}

pub use client::HttpBrowserAgent;
