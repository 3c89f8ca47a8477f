//! `aerobrain serve`: Start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("✈️  AeroBrain Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Chat model: {}", config.model_chat);
    println!(
        "   API key: {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );

    aerobrain_gateway::start(config).await?;

    Ok(())
}
