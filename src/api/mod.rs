pub mod health_client;
pub mod image_client;
pub mod traits;

use crate::{
    config::ServiceConfig,
    error::{ImagenError, Result},
    models::{GenerateImagePayload, GenerateImageResponse, HealthResponse, ModelCatalog, ServiceInfo},
};
use async_trait::async_trait;
use reqwest::Client;

pub use health_client::HealthClient;
pub use image_client::ImageClient;
pub use traits::ImageService;

/// HTTP client for the image-generation service.
#[derive(Clone)]
pub struct ApiClient {
    health_client: HealthClient,
    image_client: ImageClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ImagenError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http_client(client, config))
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS, pooling).
    pub fn with_http_client(client: Client, config: &ServiceConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            health_client: HealthClient::new(
                client.clone(),
                base_url.clone(),
                config.health_timeout,
            ),
            image_client: ImageClient::new(client, base_url.clone(), config.generate_timeout),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn service_info(&self) -> Result<ServiceInfo> {
        self.health_client.service_info().await
    }

    pub async fn models(&self) -> Result<ModelCatalog> {
        self.health_client.models().await
    }
}

#[async_trait]
impl ImageService for ApiClient {
    async fn health(&self) -> Result<HealthResponse> {
        self.health_client.check().await
    }

    async fn generate(&self, payload: &GenerateImagePayload) -> Result<GenerateImageResponse> {
        self.image_client.generate(payload).await
    }
}

pub(crate) fn transport_error(base_url: &str, error: reqwest::Error) -> ImagenError {
    if error.is_timeout() {
        ImagenError::Transport(format!("Request to {} timed out", base_url))
    } else if error.is_connect() {
        ImagenError::Transport(format!(
            "Cannot connect to image service at {}: {}",
            base_url, error
        ))
    } else {
        ImagenError::Transport(error.to_string())
    }
}
