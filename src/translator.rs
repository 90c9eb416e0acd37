use crate::bus::Bus;
use crate::domain::{CommandPayload, DISPLAY_LOCATION, DeviceCommand, DisplaySettings, OnOffSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("display settings carry no device identifier")]
    MissingDevice,
}

pub fn translate(settings: &DisplaySettings) -> Result<DeviceCommand, ValidationError> {
    if settings.device.trim().is_empty() {
        return Err(ValidationError::MissingDevice);
    }

    let display = OnOffSet::new(settings.enabled, DISPLAY_LOCATION);
    Ok(DeviceCommand::new(settings.device.clone(), CommandPayload::Display(display)))
}

/// Emits one command on `commands` for every settings value received, in order of arrival.
#[instrument(skip_all, fields(channel = commands.name()))]
pub async fn run(mut rx: UnboundedReceiver<DisplaySettings>, commands: Arc<Bus<DeviceCommand>>) {
    while let Some(settings) = rx.recv().await {
        match translate(&settings) {
            Ok(command) => {
                info!(device_id = command.device_id, "📤 Sending command: {:?}", command);
                commands.publish(command);
            }
            Err(e) => {
                warn!("⚠️ Dropping display settings {:?}: {}", settings, e);
            }
        }
    }
    debug!("Display changes closed, stopping translator");
}
