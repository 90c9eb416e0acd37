use crate::app_config::AppConfig;
use reqwest::header::HeaderValue;
use reqwest::{Client, header};
use thiserror::Error;

pub fn new_client(config: &AppConfig) -> Result<Client, RegistryClientError> {
    let mut headers = header::HeaderMap::new();
    if let Some(token) = config.registry().token() {
        let mut authorization_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        authorization_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization_value);
    }

    let client = Client::builder().timeout(config.registry().timeout()).default_headers(headers).build()?;
    Ok(client)
}

#[derive(Error, Debug)]
pub enum RegistryClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("registry client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}
