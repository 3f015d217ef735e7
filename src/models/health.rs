use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_configured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_ai_accessible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            api_configured: true,
            vertex_ai_accessible: Some(true),
            error: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "healthy" && self.api_configured
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceReadiness {
    #[default]
    Unknown,
    Ready,
    Unavailable,
}

impl ServiceReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, ServiceReadiness::Ready)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ServiceReadiness::Unknown)
    }
}

impl From<&HealthResponse> for ServiceReadiness {
    fn from(health: &HealthResponse) -> Self {
        if health.is_ready() {
            ServiceReadiness::Ready
        } else {
            ServiceReadiness::Unavailable
        }
    }
}

impl fmt::Display for ServiceReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceReadiness::Unknown => "checking",
            ServiceReadiness::Ready => "ready",
            ServiceReadiness::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}
