//! Batch scheduler driving the scan loop
//!
//! For every host the scheduler launches the host's full candidate burst as
//! spawned tasks, then checks the in-flight buffer against the configured
//! batch size. Once the buffer is over the threshold it waits for every
//! outstanding validation before generating more work.

use crate::{
    expand, CandidateGenerator, CandidateWorker, ConfigProvider, ScanError, ScanStatistics,
};
use futures::future::join_all;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What happened while scheduling one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBurst {
    pub host: Ipv4Addr,
    /// Validations launched for this host
    pub launched: usize,
    /// Buffer size when the threshold was checked
    pub buffered: usize,
    /// Whether the check triggered a barrier
    pub drained: bool,
}

pub struct BatchScheduler {
    config: Arc<dyn ConfigProvider>,
    generator: CandidateGenerator,
    worker: CandidateWorker,
    stats: Arc<ScanStatistics>,
    in_flight: Vec<JoinHandle<()>>,
}

impl BatchScheduler {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        generator: CandidateGenerator,
        worker: CandidateWorker,
    ) -> Self {
        let stats = worker.stats().clone();
        Self {
            config,
            generator,
            worker,
            stats,
            in_flight: Vec::new(),
        }
    }

    pub fn stats(&self) -> &Arc<ScanStatistics> {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Scan until a fatal error. Never returns `Ok`.
    pub async fn run(&mut self) -> Result<(), ScanError> {
        info!("Starting scan loop");
        loop {
            self.step().await?;
        }
    }

    /// Schedule one host and drain the buffer if it went over the threshold.
    pub async fn step(&mut self) -> Result<HostBurst, ScanError> {
        // Refresh failures keep the previous snapshot; the provider logs them.
        let _ = self.config.refresh_if_stale().await;
        let config = self.config.snapshot();

        let host = self.generator.next_host(&config.scope).ok_or_else(|| {
            ScanError::ConfigurationError("scope must list at least one network".to_string())
        })?;

        let allowed: Arc<[String]> = config.content_types.clone().into();
        let mut launched = 0;
        for candidate in expand(host, &config) {
            let worker = self.worker.clone();
            let allowed = allowed.clone();
            self.in_flight.push(tokio::spawn(async move {
                worker.process_candidate(candidate, &allowed).await;
            }));
            launched += 1;
        }

        let buffered = self.in_flight.len();
        let drained = buffered > config.batch_size;
        if drained {
            self.drain().await;
            self.stats.record_batch();
            info!("{}", self.stats.snapshot());
        }
        self.stats.record_iteration();

        Ok(HostBurst {
            host,
            launched,
            buffered,
            drained,
        })
    }

    /// Wait for every in-flight validation and clear the buffer.
    pub async fn drain(&mut self) {
        let pending = std::mem::take(&mut self.in_flight);
        if pending.is_empty() {
            return;
        }

        for outcome in join_all(pending).await {
            if let Err(e) = outcome {
                error!("Validation task failed: {}", e);
            }
        }
    }

    /// Drain outstanding work before the process exits.
    pub async fn shutdown(&mut self) {
        let pending = self.in_flight.len();
        if pending > 0 {
            warn!("Waiting for {} in-flight validations", pending);
        }
        self.drain().await;
        info!("{}", self.stats.snapshot());
    }
}
