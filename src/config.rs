//! Configuration management with serde serialization/deserialization
//!
//! The scanner reads a JSON file describing the scan scope, the candidate
//! search space and the probe timeouts. [`FileConfigProvider`] keeps a cached
//! snapshot of that file and reloads it once the cache goes stale, so the
//! running scan picks up edits without restarting.

use crate::ScanError;
use async_trait::async_trait;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Main configuration structure for the scanner
///
/// # Examples
///
/// ```rust
/// use camscan::Config;
///
/// let config = Config {
///     batch_size: 500,
///     ..Default::default()
/// };
/// assert_eq!(config.port_range, (8000, 8010));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Networks hosts are drawn from. Must not be empty.
    ///
    /// Only list networks you own or are authorized to audit.
    pub scope: Vec<Ipv4Net>,

    /// Half-open `[low, high)` range scanned after the fixed ports 80 and 88
    pub port_range: (u16, u16),

    /// Paths requested on every port, `{index}` expands to 0..19
    pub output_paths: Vec<String>,

    /// Media types accepted by the first probe stage
    pub content_types: Vec<String>,

    /// In-flight validations allowed to accumulate before the scheduler drains them
    pub batch_size: usize,

    /// Probe timeouts
    pub timeouts: Timeouts,

    /// Where validated cameras are appended, one JSON object per line
    pub results_path: PathBuf,

    /// Seconds a loaded snapshot is served before the file is read again (default: 10)
    pub refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scope: Vec::new(),
            port_range: (8000, 8010),
            output_paths: vec![
                "/video.mjpg".to_string(),
                "/mjpg/video.mjpg".to_string(),
                "/cgi-bin/mjpg/video.cgi".to_string(),
                "/videostream.cgi".to_string(),
                "/snapshot.jpg".to_string(),
            ],
            content_types: vec![
                "image/jpeg".to_string(),
                "multipart/x-mixed-replace".to_string(),
            ],
            batch_size: 1000,
            timeouts: Timeouts::default(),
            results_path: PathBuf::from("cameras.jsonl"),
            refresh_interval_secs: 10,
        }
    }
}

impl Config {
    /// Reject snapshots the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.scope.is_empty() {
            return Err(ScanError::ConfigurationError(
                "scope must list at least one network".to_string(),
            ));
        }

        let (low, high) = self.port_range;
        if low > high {
            return Err(ScanError::ConfigurationError(format!(
                "port range [{low}, {high}) is inverted"
            )));
        }
        if low == 0 && high > 0 {
            return Err(ScanError::ConfigurationError(
                "port range must start at 1 or above".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ScanError::ConfigurationError(
                "batch size must be greater than 0".to_string(),
            ));
        }

        if self.content_types.is_empty() {
            return Err(ScanError::ConfigurationError(
                "content type allow-list is empty".to_string(),
            ));
        }

        if self.timeouts.connect_timeout_ms == 0 || self.timeouts.read_timeout_ms == 0 {
            return Err(ScanError::ConfigurationError(
                "probe timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Per-phase probe timeouts. Total request time is not bounded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    /// TCP connect timeout in milliseconds (default: 60 000)
    pub connect_timeout_ms: u64,

    /// Wait for the response head, and for each body chunk, in milliseconds (default: 10 000)
    pub read_timeout_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 60_000,
            read_timeout_ms: 10_000,
        }
    }
}

impl Timeouts {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Bound on waiting for a response head: connect, then read.
    pub fn response(&self) -> Duration {
        self.connect() + self.read()
    }
}

/// Source of configuration snapshots for the scan loop.
///
/// Callers must tolerate `snapshot()` returning different values between calls.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Reload the underlying source if the cached snapshot is older than the
    /// provider's staleness window.
    async fn refresh_if_stale(&self) -> Result<(), ScanError>;

    /// The current snapshot.
    fn snapshot(&self) -> Arc<Config>;
}

/// Provider that never changes. Used when configuration comes from code.
pub struct StaticConfigProvider {
    config: Arc<Config>,
}

impl StaticConfigProvider {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl ConfigProvider for StaticConfigProvider {
    async fn refresh_if_stale(&self) -> Result<(), ScanError> {
        Ok(())
    }

    fn snapshot(&self) -> Arc<Config> {
        self.config.clone()
    }
}

struct CachedConfig {
    config: Arc<Config>,
    loaded_at: Instant,
}

/// JSON file provider with a time-based cache.
pub struct FileConfigProvider {
    path: PathBuf,
    overrides: ConfigOverrides,
    cached: RwLock<CachedConfig>,
}

/// Values supplied on the command line that win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub batch_size: Option<usize>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
    }
}

impl FileConfigProvider {
    /// Load and validate the file. Any failure here is fatal to the caller.
    pub async fn load(
        path: impl Into<PathBuf>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ScanError> {
        let path = path.into();
        let config = read_config(&path, &overrides).await?;

        info!("Configuration loaded from {}", path.display());
        info!("Scope: {} network(s)", config.scope.len());
        info!("Batch size: {}", config.batch_size);

        Ok(Self {
            path,
            overrides,
            cached: RwLock::new(CachedConfig {
                config: Arc::new(config),
                loaded_at: Instant::now(),
            }),
        })
    }

    fn is_stale(&self) -> bool {
        let cached = self.cached.read().unwrap_or_else(|e| e.into_inner());
        cached.loaded_at.elapsed() > cached.config.refresh_interval()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn refresh_if_stale(&self) -> Result<(), ScanError> {
        if !self.is_stale() {
            return Ok(());
        }

        let result = read_config(&self.path, &self.overrides).await;
        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
        // A failed reload still restarts the staleness window so a broken file
        // is not re-read on every host.
        cached.loaded_at = Instant::now();

        match result {
            Ok(config) => {
                debug!("Configuration reloaded from {}", self.path.display());
                cached.config = Arc::new(config);
                Ok(())
            }
            Err(e) => {
                warn!("Keeping previous configuration: {}", e);
                Err(e)
            }
        }
    }

    fn snapshot(&self) -> Arc<Config> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .config
            .clone()
    }
}

async fn read_config(path: &Path, overrides: &ConfigOverrides) -> Result<Config, ScanError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ScanError::ConfigurationError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let mut config: Config = serde_json::from_str(&content)
        .map_err(|e| ScanError::ConfigurationError(format!("{}: {}", path.display(), e)))?;

    overrides.apply(&mut config);
    config.validate()?;

    Ok(config)
}
