use webpilot_agent::{BrowserAgent, HttpBrowserAgent};
use webpilot_core::{Config, OutputSchema, Paths, TaskDescriptor, TaskType};

/// Execute one task against the configured agent service and print the
/// result, without going through the gateway.
pub async fn run(task: &str, task_type: &str) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let task_type: TaskType = task_type.parse()?;
    let descriptor = TaskDescriptor::new(task, task_type);
    let schema = OutputSchema::for_task(task_type);

    let agent = HttpBrowserAgent::new(&config.agent);
    let result = agent.execute(&descriptor.enhanced_task(), schema).await?;

    println!("{}", serde_json::to_string_pretty(&result.to_value())?);
    Ok(())
}
