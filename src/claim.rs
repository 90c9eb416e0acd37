use crate::bus::Bus;
use crate::domain::{ClaimStatus, ProvisioningCommand};
use crate::registry::{Device, RegistryError, RegistryService};
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::{Builder, Uuid};

/// Address handed to every claimed device until addresses are allocated from a real pool.
pub const PLACEHOLDER_ADDRESS: &str = "00c0";

pub const GATEWAY_ROLE: &str = "role=gateway";

/// Name-based (version 3) UUID over the raw token bytes, without a namespace.
pub fn derive_uuid(token: &str) -> Uuid {
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&Md5::digest(token.as_bytes()));
    Builder::from_md5_bytes(digest).into_uuid()
}

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("claim token is empty")]
    EmptyToken,
    #[error("registry unavailable while {operation}: {source}")]
    RegistryUnavailable {
        operation: &'static str,
        #[source]
        source: RegistryError,
    },
}

/// The outcome of the latest successful claim, observable by any number of readers.
#[derive(Debug)]
pub struct ClaimState {
    tx: watch::Sender<ClaimStatus>,
}

impl ClaimState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ClaimStatus::unclaimed());
        ClaimState { tx }
    }

    pub fn update(&self, status: ClaimStatus) {
        self.tx.send_replace(status);
    }

    pub fn current(&self) -> ClaimStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClaimStatus> {
        self.tx.subscribe()
    }
}

impl Default for ClaimState {
    fn default() -> Self {
        ClaimState::new()
    }
}

type TokenLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug)]
pub struct ClaimOrchestrator {
    registry: Arc<dyn RegistryService>,
    application: String,
    provisioning: Arc<Bus<ProvisioningCommand>>,
    state: Arc<ClaimState>,
    in_flight: Mutex<HashMap<String, TokenLock>>,
}

impl ClaimOrchestrator {
    pub fn new(
        registry: Arc<dyn RegistryService>,
        application: impl Into<String>,
        provisioning: Arc<Bus<ProvisioningCommand>>,
        state: Arc<ClaimState>,
    ) -> Self {
        ClaimOrchestrator {
            registry,
            application: application.into(),
            provisioning,
            state,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.current()
    }

    /// Claims the device behind `token`. Failures are logged and reported as an unclaimed status.
    pub async fn claim(&self, token: &str) -> ClaimStatus {
        match self.try_claim(token).await {
            Ok(status) => status,
            Err(e) => {
                warn!(token, "⚠️ Claiming device '{}'... failed, {}", token, e);
                ClaimStatus::unclaimed()
            }
        }
    }

    /// Claims for the same token run one at a time, claims for different tokens run concurrently.
    pub async fn try_claim(&self, token: &str) -> Result<ClaimStatus, ClaimError> {
        if token.is_empty() {
            return Err(ClaimError::EmptyToken);
        }

        let release = TokenLockRelease {
            orchestrator: self,
            token,
            lock: self.token_lock(token),
        };
        let _guard = release.lock.lock().await;
        self.claim_exclusively(token).await
    }

    #[instrument(skip(self))]
    async fn claim_exclusively(&self, token: &str) -> Result<ClaimStatus, ClaimError> {
        info!("📝 Claiming device '{}'...", token);

        let uuid = derive_uuid(token);
        let address = PLACEHOLDER_ADDRESS.to_string();

        let gateways = self.discover_gateways().await?;
        info!(gateways = ?gateways, "📝 Using {} gateway(s)", gateways.len());

        let device = Device::new(token, &self.application, vec![address.clone(), uuid.to_string()], gateways);
        match serde_json::to_string(&device) {
            Ok(json) => info!("📝 Creating device: {}", json),
            Err(e) => debug!("Could not serialize device '{}' for logging: {}", token, e),
        }

        self.registry
            .create_device(&self.application, &device)
            .await
            .map_err(|source| ClaimError::RegistryUnavailable {
                operation: "creating the device",
                source,
            })?;

        let command = ProvisioningCommand::new(uuid, address.clone());
        let gateways_notified = self.provisioning.publish(command);
        debug!(gateways_notified, "📝 Published provisioning command for {}", uuid);

        let status = ClaimStatus::claimed(address);
        self.state.update(status.clone());

        info!(device = %uuid, "📝 Claiming device '{}'... OK", token);
        Ok(status)
    }

    async fn discover_gateways(&self) -> Result<Vec<String>, ClaimError> {
        let gateways = self
            .registry
            .list_devices(&self.application, GATEWAY_ROLE)
            .await
            .map_err(|source| ClaimError::RegistryUnavailable {
                operation: "discovering gateways",
                source,
            })?;

        Ok(gateways.into_iter().map(|gateway| gateway.metadata.name).collect())
    }

    fn token_lock(&self, token: &str) -> TokenLock {
        self.lock_in_flight().entry(token.to_string()).or_default().clone()
    }

    fn release_token_lock(&self, token: &str, lock: &TokenLock) {
        let mut in_flight = self.lock_in_flight();
        // One reference in the map, one held here: nobody else is waiting on this token
        if Arc::strong_count(lock) == 2 {
            in_flight.remove(token);
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, TokenLock>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drops the token's map entry once the claim finishes or its future is dropped.
struct TokenLockRelease<'a> {
    orchestrator: &'a ClaimOrchestrator,
    token: &'a str,
    lock: TokenLock,
}

impl Drop for TokenLockRelease<'_> {
    fn drop(&mut self) {
        self.orchestrator.release_token_lock(self.token, &self.lock);
    }
}
