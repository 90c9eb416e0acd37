use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub device: String,
    pub enabled: bool,
}

impl DisplaySettings {
    pub fn new(device: impl Into<String>, enabled: bool) -> Self {
        DisplaySettings {
            device: device.into(),
            enabled,
        }
    }
}
