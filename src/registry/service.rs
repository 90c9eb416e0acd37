use crate::app_config;
use crate::registry::device::Device;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, warn};

/// The registry operations the claim workflow depends on. Both calls go over the network.
#[async_trait]
pub trait RegistryService: Debug + Send + Sync {
    /// Devices of `application` matching the label selector, e.g. `role=gateway`.
    async fn list_devices(&self, application: &str, labels: &str) -> Result<Vec<Device>, RegistryError>;

    async fn create_device(&self, application: &str, device: &Device) -> Result<(), RegistryError>;
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("registry responded with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

impl RegistryError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RegistryError::Unavailable(e) => !e.is_decode() && !e.is_builder(),
            RegistryError::Rejected { status, .. } => status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Debug)]
pub struct HttpRegistry {
    client: Client,
    url: String,
    retry_ms: u64,
    retry_max_delay: Duration,
    max_retries: usize,
}

impl HttpRegistry {
    pub fn new(client: Client, config: &app_config::Registry) -> Self {
        HttpRegistry {
            client,
            url: config.url().to_string(),
            retry_ms: config.retry_ms(),
            retry_max_delay: config.retry_max_delay(),
            max_retries: config.max_retries(),
        }
    }

    fn devices_url(&self, application: &str) -> String {
        format!("{}/api/registry/v1alpha1/apps/{}/devices", self.url, application)
    }

    async fn fetch_devices(&self, application: &str, labels: &str) -> Result<Vec<Device>, RegistryError> {
        let response = self.client.get(self.devices_url(application)).query(&[("labels", labels)]).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status_code = %status, "⚠️ Listing devices failed. Response: {}", body);
            return Err(RegistryError::Rejected { status, body });
        }

        // The registry answers `null` rather than `[]` when nothing matches
        let devices = response.json::<Option<Vec<Device>>>().await?;
        Ok(devices.unwrap_or_default())
    }
}

#[async_trait]
impl RegistryService for HttpRegistry {
    #[instrument(skip(self))]
    async fn list_devices(&self, application: &str, labels: &str) -> Result<Vec<Device>, RegistryError> {
        debug!("Retrieving registry devices...");

        let strategy = ExponentialBackoff::from_millis(self.retry_ms)
            .factor(2)
            .max_delay(self.retry_max_delay)
            .map(jitter)
            .take(self.max_retries);

        let devices = RetryIf::spawn(strategy, || self.fetch_devices(application, labels), RegistryError::is_transient).await?;
        info!("Retrieving registry devices... OK, {} found", devices.len());

        Ok(devices)
    }

    #[instrument(skip_all, fields(application = application, device = device.name()))]
    async fn create_device(&self, application: &str, device: &Device) -> Result<(), RegistryError> {
        debug!("Creating registry device...");

        let response = self.client.post(self.devices_url(application)).json(device).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status_code = %status, "⚠️ Creating registry device... failed. Response: {}", body);
            return Err(RegistryError::Rejected { status, body });
        }

        info!("Creating registry device... OK");
        Ok(())
    }
}
