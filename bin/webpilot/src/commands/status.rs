use webpilot_core::{Config, Paths};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("webpilot status");
    println!("===============");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:  {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (using defaults)" }
    );

    let config = Config::load_or_default(&paths)?;

    println!(
        "Gateway: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("Origins: {}", config.gateway.allowed_origins.join(", "));
    println!();

    println!("Agent service:");
    println!("  api_base: {}", config.agent.api_base);
    println!("  model:    {}", config.agent.model);
    println!(
        "  api_key:  {}",
        if config.agent.api_key.is_empty() {
            "✗ not set"
        } else {
            "✓ configured"
        }
    );

    Ok(())
}
