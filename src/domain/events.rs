use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An uplink message as handed over by the integration, the payload is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub device_id: String,
    #[serde(default)]
    pub payload: Value,
}

impl DeviceEvent {
    pub fn new(device_id: impl Into<String>, payload: Value) -> Self {
        DeviceEvent {
            device_id: device_id.into(),
            payload,
        }
    }
}
