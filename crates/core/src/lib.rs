pub mod config;
pub mod error;
pub mod event;
pub mod paths;
pub mod schema;
pub mod task;

pub use config::{AgentConfig, Config, GatewayConfig};
pub use error::{Error, Result};
pub use event::{EventKind, StreamEvent};
pub use paths::Paths;
pub use schema::{
    AgentResult, FormField, FormResult, OutputSchema, Product, SearchResults, SubmissionStatus,
};
pub use task::{TaskDescriptor, TaskType};
