use crate::{
    error::{ImagenError, Result},
    models::{ErrorDetail, GenerateImagePayload, GenerateImageResponse},
};
use reqwest::Client;
use std::time::Duration;

use super::transport_error;

pub const GENERATE_FAILED: &str = "Failed to generate image";

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ImageClient {
    pub fn new(client: Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub async fn generate(&self, payload: &GenerateImagePayload) -> Result<GenerateImageResponse> {
        let url = format!("{}/generate-image", self.base_url);

        log::info!(
            "Requesting image: aspect_ratio={}, person_generation={}",
            payload.aspect_ratio,
            payload.person_generation
        );
        log::debug!(
            "Generate request payload: {}",
            serde_json::to_string(payload).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| transport_error(&self.base_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.base_url, e))?;

        if !status.is_success() {
            log::warn!("Generate endpoint returned HTTP {}", status.as_u16());
            return Err(ImagenError::Service(error_message_from_body(&body)));
        }

        serde_json::from_str::<GenerateImageResponse>(&body)
            .map_err(|e| ImagenError::Transport(format!("Invalid response from service: {}", e)))
    }
}

/// Pulls a human-readable message out of a non-2xx body.
fn error_message_from_body(body: &str) -> String {
    if let Ok(detail) = serde_json::from_str::<ErrorDetail>(body) {
        if let Some(message) = detail.message() {
            return message;
        }
    }
    if let Ok(response) = serde_json::from_str::<GenerateImageResponse>(body) {
        if let Some(error) = response.error.filter(|e| !e.trim().is_empty()) {
            return error;
        }
    }
    GENERATE_FAILED.to_string()
}
