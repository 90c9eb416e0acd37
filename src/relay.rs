use crate::domain::{DeviceCommand, ProvisioningCommand};
use std::fmt::Debug;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument, warn};

/// An outbound message as the transport hands it to its destination.
pub trait WireMessage: Debug + Send + 'static {
    fn target(&self) -> String;

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl WireMessage for DeviceCommand {
    fn target(&self) -> String {
        self.device_id.clone()
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        Ok(self.payload.encode())
    }
}

impl WireMessage for ProvisioningCommand {
    fn target(&self) -> String {
        self.device.to_string()
    }

    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Hands every message of a channel to the outbound transport until the channel closes.
///
/// Returns the number of relayed messages.
#[instrument(skip(rx))]
pub async fn relay<T: WireMessage>(channel: &'static str, mut rx: UnboundedReceiver<T>) -> usize {
    let mut relayed = 0;
    while let Some(message) = rx.recv().await {
        match message.encode() {
            Ok(bytes) => {
                info!(target_device = %message.target(), payload = %hex::encode(&bytes), "🚀 Relaying {:?}", message);
                relayed += 1;
            }
            Err(e) => warn!("⚠️ Could not encode {:?}: {}", message, e),
        }
    }
    debug!(relayed, "Channel closed, stopping relay");
    relayed
}
