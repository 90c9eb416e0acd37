pub mod claim;
pub mod commands;
pub mod display;
pub mod events;

pub use claim::ClaimStatus;
pub use commands::{CommandPayload, DISPLAY_LOCATION, DeviceCommand, OnOffSet, ProvisioningCommand};
pub use display::DisplaySettings;
pub use events::DeviceEvent;
