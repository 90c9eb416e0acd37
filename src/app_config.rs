use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    registry: Registry,
    events: Events,
}

impl AppConfig {
    /// Layers `config.toml`, an optional `config_local.toml` and the environment, e.g. `REGISTRY__APPLICATION=my-app`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn events(&self) -> &Events {
        &self.events
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    event_buffer_size: usize,
}

impl Core {
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

#[derive(Debug, Deserialize)]
pub struct Registry {
    url: String,
    application: String,
    token: Option<String>,
    timeout_ms: u64,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    max_retries: usize,
}

impl Registry {
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// The application scope used for every registry operation.
    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

#[derive(Debug, Deserialize)]
pub struct Events {
    url: String,
    retry_ms: u64,
    retry_max_delay_ms: u64,
    stale_connection_timeout_ms: u64,
}

impl Events {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_ms(&self) -> u64 {
        self.retry_ms
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn stale_connection_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_connection_timeout_ms)
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core { event_buffer_size: 1 },
                registry: Registry {
                    url: "https://registry.url".to_string(),
                    application: "app".to_string(),
                    token: None,
                    timeout_ms: 1_000,
                    retry_ms: 1,
                    retry_max_delay_ms: 5,
                    max_retries: 2,
                },
                events: Events {
                    url: "https://events.url/stream".to_string(),
                    retry_ms: 100,
                    retry_max_delay_ms: 200,
                    stale_connection_timeout_ms: 30_000,
                },
            },
        }
    }

    pub fn registry_url(mut self, url: String) -> Self {
        self.config.registry.url = url;
        self
    }

    pub fn registry_token(mut self, token: &str) -> Self {
        self.config.registry.token = Some(token.to_string());
        self
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.config.registry.max_retries = max_retries;
        self
    }

    pub fn events_url(mut self, url: String) -> Self {
        self.config.events.url = url;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
