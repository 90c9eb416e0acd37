use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slot of the display element within the device's command layout.
pub const DISPLAY_LOCATION: u16 = 0x0100;

const GENERIC_ON_OFF_SET: [u8; 2] = [0x82, 0x02];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnOffSet {
    pub on: bool,
    pub location: u16,
}

impl OnOffSet {
    pub fn new(on: bool, location: u16) -> Self {
        OnOffSet { on, location }
    }

    /// `on_off` followed by a zero transaction id, no transition or delay.
    fn parameters(&self) -> [u8; 2] {
        [u8::from(self.on), 0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPayload {
    Display(OnOffSet),
}

impl CommandPayload {
    pub fn location(&self) -> u16 {
        match self {
            CommandPayload::Display(set) => set.location,
        }
    }

    /// Binary form understood by the device: `location (u16, big endian) | opcode | parameters`.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(6);
        bytes.extend_from_slice(&self.location().to_be_bytes());
        match self {
            CommandPayload::Display(set) => {
                bytes.extend_from_slice(&GENERIC_ON_OFF_SET);
                bytes.extend_from_slice(&set.parameters());
            }
        }
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
    pub device_id: String,
    pub payload: CommandPayload,
}

impl DeviceCommand {
    pub fn new(device_id: impl Into<String>, payload: CommandPayload) -> Self {
        DeviceCommand {
            device_id: device_id.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningCommand {
    pub device: Uuid,
    pub address: String,
}

impl ProvisioningCommand {
    pub fn new(device: Uuid, address: impl Into<String>) -> Self {
        ProvisioningCommand {
            device,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(true, vec![0x01, 0x00, 0x82, 0x02, 0x01, 0x00])]
    #[case(false, vec![0x01, 0x00, 0x82, 0x02, 0x00, 0x00])]
    fn encodes_a_display_command(#[case] on: bool, #[case] expected: Vec<u8>) {
        let payload = CommandPayload::Display(OnOffSet::new(on, DISPLAY_LOCATION));

        assert_eq!(payload.encode(), expected);
    }

    #[test]
    fn serializes_a_device_command_to_json() -> Result<(), serde_json::Error> {
        let command = DeviceCommand::new("dev-1", CommandPayload::Display(OnOffSet::new(true, DISPLAY_LOCATION)));

        assert_eq!(
            serde_json::to_value(&command)?,
            json!({ "deviceId": "dev-1", "payload": { "display": { "on": true, "location": 256 } } })
        );
        Ok(())
    }

    #[test]
    fn serializes_a_provisioning_command_with_a_hyphenated_uuid() -> Result<(), serde_json::Error> {
        let uuid = Uuid::parse_str("e99a18c428cb38d5b260853678922e03").expect("valid uuid");
        let command = ProvisioningCommand::new(uuid, "00c0");

        assert_eq!(
            serde_json::to_value(&command)?,
            json!({ "device": "e99a18c4-28cb-38d5-b260-853678922e03", "address": "00c0" })
        );
        Ok(())
    }
}
