use crate::{api::ImageService, models::ServiceReadiness};
use std::sync::Arc;

/// Probes the generation service once and remembers the answer.
///
/// Readiness moves from `Unknown` to `Ready` or `Unavailable` on the first
/// probe and stays there for the lifetime of the monitor. Probe failures of
/// any kind are logged and read as `Unavailable`.
pub struct AvailabilityMonitor {
    service: Arc<dyn ImageService>,
    readiness: ServiceReadiness,
}

impl AvailabilityMonitor {
    pub fn new(service: Arc<dyn ImageService>) -> Self {
        Self {
            service,
            readiness: ServiceReadiness::Unknown,
        }
    }

    /// Builds the monitor and runs its single probe.
    pub async fn initialize(service: Arc<dyn ImageService>) -> Self {
        let mut monitor = Self::new(service);
        monitor.check_readiness().await;
        monitor
    }

    pub async fn check_readiness(&mut self) -> ServiceReadiness {
        if self.readiness.is_known() {
            return self.readiness;
        }

        self.readiness = match self.service.health().await {
            Ok(health) => {
                let readiness = ServiceReadiness::from(&health);
                if readiness.is_ready() {
                    log::info!("✅ Image service is ready");
                } else {
                    log::warn!(
                        "Image service not ready: status={}, api_configured={}{}",
                        health.status,
                        health.api_configured,
                        health
                            .error
                            .as_deref()
                            .map(|e| format!(", error={}", e))
                            .unwrap_or_default()
                    );
                }
                readiness
            }
            Err(e) => {
                log::warn!("Health check failed: {}", e);
                ServiceReadiness::Unavailable
            }
        };
        self.readiness
    }

    pub fn readiness(&self) -> ServiceReadiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }
}
