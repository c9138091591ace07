use serde::{Deserialize, Serialize};

/// Category of automation task. Selects the output schema and the
/// augmentation template applied before the task reaches the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Search,
    FormFill,
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Search => "search",
            TaskType::FormFill => "form_fill",
            TaskType::General => "general",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(TaskType::Search),
            "form_fill" => Ok(TaskType::FormFill),
            "general" => Ok(TaskType::General),
            other => Err(crate::error::Error::Validation(format!(
                "Unknown task type '{}' (expected search, form_fill or general)",
                other
            ))),
        }
    }
}

/// One inbound task request, normalized from either transport.
/// Constructed once per request and consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    pub task: String,
    #[serde(default)]
    pub task_type: TaskType,
}

impl TaskDescriptor {
    pub fn new(task: &str, task_type: TaskType) -> Self {
        Self {
            task: task.to_string(),
            task_type,
        }
    }

    /// Rewrite the task text through the template for its type. Search tasks
    /// get a data-quality hint for URL extraction; form tasks get the
    /// field-filling instructions and sample-data conventions the agent
    /// should use when the task itself does not supply values.
    pub fn enhanced_task(&self) -> String {
        match self.task_type {
            TaskType::Search => format!(
                "{}\n\nWhen extracting products, record the product page URL and the \
                 product image URL as separate fields. Never substitute the image URL \
                 for the page URL.",
                self.task
            ),
            TaskType::FormFill => format!(
                "{}\n\nFill every visible form field. Unless the task specifies values, \
                 use these sample-data conventions:\n\
                 - Full names: realistic names such as \"Rahul Sharma\" or \"Priya Patel\"\n\
                 - Email addresses: test@example.com\n\
                 - Phone numbers: +91-XXXXXXXXXX format with random digits\n\
                 - Passwords: SecurePass123! style (uppercase, lowercase, digits and a symbol)\n\
                 After filling the fields, submit the form and report every field you \
                 filled along with its selector and the submission outcome.",
                self.task
            ),
            TaskType::General => self.task.clone(),
        }
    }
}
