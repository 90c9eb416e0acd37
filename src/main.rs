use lora_claim_bridge::app_config::AppConfig;
use lora_claim_bridge::bridge::Bridge;
use lora_claim_bridge::bus::{DEVICE_COMMANDS, GATEWAY_COMMANDS};
use lora_claim_bridge::domain::DeviceEvent;
use lora_claim_bridge::registry::{HttpRegistry, new_client};
use lora_claim_bridge::relay::relay;
use lora_claim_bridge::sse;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(application = config.registry().application(), "✅  Loaded configuration");

    let registry_client = new_client(&config)?;
    let registry = Arc::new(HttpRegistry::new(registry_client, config.registry()));

    let bridge = Bridge::start(registry, config.registry().application());

    task::spawn(relay(DEVICE_COMMANDS, bridge.subscribe_device_commands()));
    task::spawn(relay(GATEWAY_COMMANDS, bridge.subscribe_gateway_commands()));
    info!("✅  Initialized command relays");

    let (tx, rx) = mpsc::channel::<DeviceEvent>(config.core().event_buffer_size());
    let ingest = bridge.event_ingest();
    task::spawn(async move {
        ingest.listen(rx).await;
    });
    info!("✅  Initialized event ingest");

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    // The event stream is a separate integration, it does not share the registry credentials
    sse::listen(tx, &Client::new(), config.events()).await?;

    Ok(())
}
