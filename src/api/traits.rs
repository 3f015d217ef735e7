use crate::{
    error::Result,
    models::{GenerateImagePayload, GenerateImageResponse, HealthResponse},
};
use async_trait::async_trait;

/// The two calls the monitor and orchestrator make against the remote service.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn health(&self) -> Result<HealthResponse>;

    /// Returns the parsed body of a 2xx response, whether or not it reports
    /// success. Non-2xx responses and transport failures are errors.
    async fn generate(&self, payload: &GenerateImagePayload) -> Result<GenerateImageResponse>;
}
