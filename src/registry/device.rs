use serde::{Deserialize, Serialize};

/// A device as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: DeviceSpec,
}

impl Device {
    pub fn new(name: impl Into<String>, application: impl Into<String>, aliases: Vec<String>, gateways: Vec<String>) -> Self {
        Device {
            metadata: Metadata {
                name: name.into(),
                application: application.into(),
            },
            spec: DeviceSpec {
                alias: Some(DeviceAliases { aliases }),
                gateway_selector: Some(GatewaySelector { match_names: gateways }),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub application: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<DeviceAliases>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_selector: Option<GatewaySelector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAliases {
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySelector {
    pub match_names: Vec<String>,
}
