//! # rimagen
//!
//! Client for a text-to-image generation service. An [`AvailabilityMonitor`]
//! probes the service once; a [`GenerationOrchestrator`] validates and submits
//! prompts, tracks the request lifecycle, and saves the resulting image
//! through an [`ArtifactSink`].
//!
//! ```no_run
//! use rimagen::{ApiClient, AvailabilityMonitor, FileSink, GenerationOrchestrator, GenerationRequest, ServiceConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> rimagen::Result<()> {
//! let service = Arc::new(ApiClient::new(&ServiceConfig::from_env())?);
//! let monitor = AvailabilityMonitor::initialize(service.clone()).await;
//!
//! let orchestrator = GenerationOrchestrator::new(service, Arc::new(FileSink::new(".")));
//! if orchestrator.submit_enabled(monitor.is_ready()) {
//!     orchestrator.submit(GenerationRequest::new("a red fox in snow")?).await?;
//!     orchestrator.download_current_result().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod logger;
pub mod models;
pub mod monitor;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ImageService};
pub use config::{Config, DownloadConfig, ServiceConfig};
pub use download::{ArtifactSink, FileSink, SavedArtifact};
pub use error::{ImagenError, Result};
pub use models::*;
pub use monitor::AvailabilityMonitor;
pub use orchestrator::{GenerationOrchestrator, OrchestratorSnapshot, RequestLifecycle};
