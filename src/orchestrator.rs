use crate::{
    api::{image_client::GENERATE_FAILED, ImageService},
    config::DEFAULT_FILE_PREFIX,
    download::{ArtifactSink, SavedArtifact, TimestampNamer},
    error::{ImagenError, Result},
    logger,
    models::{GenerateImageResponse, GeneratedImage, GenerationRequest, GenerationResult},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt";
pub const CONNECT_FAILED: &str = "Failed to connect to API";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Owned copy of the orchestrator's observable state.
#[derive(Debug, Clone)]
pub struct OrchestratorSnapshot {
    pub form: GenerationRequest,
    pub lifecycle: RequestLifecycle,
    pub result: Option<GenerationResult>,
    pub downloads: usize,
}

impl OrchestratorSnapshot {
    pub fn image(&self) -> Option<&GeneratedImage> {
        self.result.as_ref().and_then(GenerationResult::image)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().and_then(GenerationResult::error_message)
    }
}

struct OrchestratorState {
    form: GenerationRequest,
    result: Option<GenerationResult>,
    downloads: usize,
}

/// Clears the in-flight flag when a submission ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives one generation at a time against the image service and keeps
/// the outcome for display and download.
pub struct GenerationOrchestrator {
    service: Arc<dyn ImageService>,
    sink: Arc<dyn ArtifactSink>,
    namer: TimestampNamer,
    in_flight: AtomicBool,
    inner: Mutex<OrchestratorState>,
}

impl GenerationOrchestrator {
    pub fn new(service: Arc<dyn ImageService>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self::with_file_prefix(service, sink, DEFAULT_FILE_PREFIX)
    }

    pub fn with_file_prefix(
        service: Arc<dyn ImageService>,
        sink: Arc<dyn ArtifactSink>,
        file_prefix: impl Into<String>,
    ) -> Self {
        Self {
            service,
            sink,
            namer: TimestampNamer::new(file_prefix),
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(OrchestratorState {
                form: GenerationRequest::default(),
                result: None,
                downloads: 0,
            }),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the submit action should be offered to the user.
    pub fn submit_enabled(&self, service_ready: bool) -> bool {
        service_ready && !self.is_in_flight()
    }

    pub async fn lifecycle(&self) -> RequestLifecycle {
        let state = self.inner.lock().await;
        self.lifecycle_of(&state)
    }

    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.inner.lock().await;
        OrchestratorSnapshot {
            form: state.form.clone(),
            lifecycle: self.lifecycle_of(&state),
            result: state.result.clone(),
            downloads: state.downloads,
        }
    }

    fn lifecycle_of(&self, state: &OrchestratorState) -> RequestLifecycle {
        if self.is_in_flight() {
            return RequestLifecycle::Submitting;
        }
        match &state.result {
            None => RequestLifecycle::Idle,
            Some(GenerationResult::Success(_)) => RequestLifecycle::Succeeded,
            Some(GenerationResult::Failure { .. }) => RequestLifecycle::Failed,
        }
    }

    /// Applies an edit to the form. A rejected edit leaves the form unchanged.
    pub async fn update_form<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut GenerationRequest) -> Result<()>,
    {
        let mut state = self.inner.lock().await;
        let mut form = state.form.clone();
        edit(&mut form)?;
        state.form = form;
        Ok(())
    }

    pub async fn submit_form(&self) -> Result<()> {
        let form = self.inner.lock().await.form.clone();
        self.submit(form).await
    }

    /// Runs one submission to completion. The outcome is recorded in the
    /// orchestrator's state; the only error returned is `InFlight`, when
    /// another submission has not finished yet.
    pub async fn submit(&self, request: GenerationRequest) -> Result<()> {
        // The flag and the result change under one lock so observers never
        // see Submitting next to a stale result.
        let _guard = {
            let mut state = self.inner.lock().await;
            if self
                .in_flight
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                log::warn!("Submit ignored: a generation request is already in flight");
                return Err(ImagenError::InFlight);
            }
            let guard = InFlightGuard(&self.in_flight);

            if !request.has_prompt() {
                state.result = Some(GenerationResult::Failure {
                    message: EMPTY_PROMPT_MESSAGE.to_string(),
                });
                self.in_flight.store(false, Ordering::SeqCst);
                return Ok(());
            }

            state.result = None;
            guard
        };

        let submission_id = Uuid::new_v4();
        let payload = request.to_payload();
        log::info!("🎨 Submission {} started", submission_id);

        let outcome = {
            let _timer = logger::timer("generate-image");
            self.service.generate(&payload).await
        };

        let result = map_outcome(outcome);
        match &result {
            GenerationResult::Success(image) => log::info!(
                "✅ Submission {} succeeded: {} bytes",
                submission_id,
                image.size()
            ),
            GenerationResult::Failure { message } => {
                log::error!("❌ Submission {} failed: {}", submission_id, message)
            }
        }
        self.finish(result).await;
        Ok(())
    }

    async fn finish(&self, result: GenerationResult) {
        let mut state = self.inner.lock().await;
        state.result = Some(result);
        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Saves the current image under a fresh timestamped filename.
    /// Returns `Ok(None)` when there is no successful result to save.
    pub async fn download_current_result(&self) -> Result<Option<SavedArtifact>> {
        if self.is_in_flight() {
            return Ok(None);
        }
        let image = {
            let state = self.inner.lock().await;
            match state.result.as_ref().and_then(GenerationResult::image) {
                Some(image) => image.clone(),
                None => {
                    log::debug!("Download requested with no generated image");
                    return Ok(None);
                }
            }
        };

        let filename = self.namer.next_name(image.format.extension());
        let saved = self.sink.save(&filename, &image.bytes).await?;
        self.inner.lock().await.downloads += 1;
        Ok(Some(saved))
    }
}

fn map_outcome(outcome: Result<GenerateImageResponse>) -> GenerationResult {
    let response = match outcome {
        Ok(response) => response,
        Err(ImagenError::Service(message)) => return failure(message, GENERATE_FAILED),
        Err(e) => return failure(e.user_message(), CONNECT_FAILED),
    };

    match response.image_data {
        Some(data) if response.success && !data.trim().is_empty() => {
            match GeneratedImage::from_base64(&data, response.generation_time) {
                Ok(image) => GenerationResult::Success(image),
                Err(e) => failure(e.user_message(), GENERATE_FAILED),
            }
        }
        _ => failure(response.error.unwrap_or_default(), GENERATE_FAILED),
    }
}

fn failure(message: String, fallback: &str) -> GenerationResult {
    let message = if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    };
    GenerationResult::Failure { message }
}
