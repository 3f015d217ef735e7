use crate::logger::LogLevel;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_FILE_PREFIX: &str = "generated-image";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub health_timeout: Duration,
    pub generate_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub download: DownloadConfig,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            health_timeout: Duration::from_secs(5),
            generate_timeout: Duration::from_secs(120),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup("IMAGEN_API_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| normalize_base_url(&url))
            .unwrap_or(defaults.base_url);
        let health_timeout = lookup("IMAGEN_HEALTH_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.health_timeout);
        let generate_timeout = lookup("IMAGEN_GENERATE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.generate_timeout);

        ServiceConfig {
            base_url,
            health_timeout,
            generate_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_timeouts(mut self, health: Duration, generate: Duration) -> Self {
        self.health_timeout = health;
        self.generate_timeout = generate;
        self
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        DownloadConfig {
            output_dir: lookup("IMAGEN_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            file_prefix: lookup("IMAGEN_FILE_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.file_prefix),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig::default(),
            download: DownloadConfig::default(),
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_level = lookup("IMAGEN_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogLevel::Info);

        Config {
            service: ServiceConfig::from_lookup(&lookup),
            download: DownloadConfig::from_lookup(&lookup),
            log_level,
            log_file: lookup("IMAGEN_LOG_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }

    pub fn with_download(mut self, download: DownloadConfig) -> Self {
        self.download = download;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
