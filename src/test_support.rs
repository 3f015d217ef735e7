//! In-memory stand-ins for the remote service and the file-save capability.

use crate::{
    api::ImageService,
    download::{ArtifactSink, SavedArtifact},
    error::{ImagenError, Result},
    models::{GenerateImagePayload, GenerateImageResponse, HealthResponse},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

pub type Scripted<T> = std::result::Result<T, ImagenError>;

#[derive(Default)]
pub struct FakeService {
    health: Mutex<VecDeque<Scripted<HealthResponse>>>,
    generate: Mutex<VecDeque<Scripted<GenerateImageResponse>>>,
    payloads: Mutex<Vec<GenerateImagePayload>>,
    health_calls: AtomicUsize,
    /// When set, `generate` announces itself on `entered` and waits for a
    /// permit before answering.
    gate: Option<(Arc<Notify>, Arc<Semaphore>)>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_health(self, response: Scripted<HealthResponse>) -> Self {
        self.health.lock().unwrap().push_back(response);
        self
    }

    pub fn with_generate(self, response: Scripted<GenerateImageResponse>) -> Self {
        self.generate.lock().unwrap().push_back(response);
        self
    }

    /// Returns `(entered, release)`.
    pub fn gated(mut self) -> (Self, Arc<Notify>, Arc<Semaphore>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Semaphore::new(0));
        self.gate = Some((entered.clone(), release.clone()));
        (self, entered, release)
    }

    pub fn generate_calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<GenerateImagePayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageService for FakeService {
    async fn health(&self) -> Result<HealthResponse> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ImagenError::Transport("no scripted health".into())))
    }

    async fn generate(&self, payload: &GenerateImagePayload) -> Result<GenerateImageResponse> {
        self.payloads.lock().unwrap().push(payload.clone());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.acquire().await.unwrap().forget();
        }
        self.generate
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ImagenError::Transport("no scripted response".into())))
    }
}

#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedArtifact> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(SavedArtifact {
            filename: filename.to_string(),
            location: None,
            bytes_written: bytes.len(),
        })
    }
}
