use crate::{
    error::{ImagenError, Result},
    models::{HealthResponse, ModelCatalog, ServiceInfo},
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::transport_error;

#[derive(Clone)]
pub struct HealthClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HealthClient {
    pub fn new(client: Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub async fn check(&self) -> Result<HealthResponse> {
        self.get_json("/health").await
    }

    pub async fn service_info(&self) -> Result<ServiceInfo> {
        self.get_json("/").await
    }

    pub async fn models(&self) -> Result<ModelCatalog> {
        self.get_json("/models").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImagenError::Service(format!(
                "{} returned HTTP {}",
                path,
                status.as_u16()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ImagenError::Transport(format!("Invalid response from {}: {}", path, e)))
    }
}
