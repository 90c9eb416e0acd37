use crate::bus::{Bus, DEVICE_COMMANDS, GATEWAY_COMMANDS};
use crate::claim::{ClaimOrchestrator, ClaimState};
use crate::display_store::DisplayStateStore;
use crate::domain::{ClaimStatus, DeviceCommand, DeviceEvent, DisplaySettings, ProvisioningCommand};
use crate::ingest::EventIngest;
use crate::registry::RegistryService;
use crate::translator;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task;
use tracing::info;

/// Wires the display, command and claim pipelines together.
///
/// Must be started inside a tokio runtime, the command translator runs as a background task.
#[derive(Debug)]
pub struct Bridge {
    display: Arc<DisplayStateStore>,
    claims: ClaimOrchestrator,
    ingest: Arc<EventIngest>,
    device_commands: Arc<Bus<DeviceCommand>>,
    gateway_commands: Arc<Bus<ProvisioningCommand>>,
}

impl Bridge {
    pub fn start(registry: Arc<dyn RegistryService>, application: impl Into<String>) -> Self {
        let display = Arc::new(DisplayStateStore::new());
        let device_commands = Arc::new(Bus::new(DEVICE_COMMANDS));
        let gateway_commands = Arc::new(Bus::new(GATEWAY_COMMANDS));

        task::spawn(translator::run(display.subscribe(), device_commands.clone()));
        info!("✅  Initialized command translator");

        let claims = ClaimOrchestrator::new(registry, application, gateway_commands.clone(), Arc::new(ClaimState::new()));

        Bridge {
            display,
            claims,
            ingest: Arc::new(EventIngest::new()),
            device_commands,
            gateway_commands,
        }
    }

    pub fn update_display_settings(&self, settings: DisplaySettings) {
        self.display.update(settings);
    }

    pub fn display_settings(&self) -> Option<DisplaySettings> {
        self.display.current()
    }

    pub async fn claim_device(&self, token: &str) -> ClaimStatus {
        self.claims.claim(token).await
    }

    pub fn claim_status(&self) -> ClaimStatus {
        self.claims.status()
    }

    pub fn ingest(&self, event: DeviceEvent) {
        self.ingest.ingest(event);
    }

    pub fn event_ingest(&self) -> Arc<EventIngest> {
        self.ingest.clone()
    }

    pub fn subscribe_device_commands(&self) -> UnboundedReceiver<DeviceCommand> {
        self.device_commands.subscribe()
    }

    pub fn subscribe_gateway_commands(&self) -> UnboundedReceiver<ProvisioningCommand> {
        self.gateway_commands.subscribe()
    }
}
