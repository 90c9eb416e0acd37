mod client;
mod device;
mod service;

pub use client::{RegistryClientError, new_client};
pub use device::{Device, DeviceAliases, DeviceSpec, GatewaySelector, Metadata};
pub use service::{HttpRegistry, RegistryError, RegistryService};
