use crate::{Candidate, ResultSink, ScanStatistics, ValidatedCamera, ValidationResult, Validator};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs one candidate through validation and records the outcome.
///
/// Cheap to clone; every spawned validation task holds its own copy.
#[derive(Clone)]
pub struct CandidateWorker {
    validator: Arc<Validator>,
    sink: Arc<dyn ResultSink>,
    stats: Arc<ScanStatistics>,
}

impl CandidateWorker {
    pub fn new(
        validator: Arc<Validator>,
        sink: Arc<dyn ResultSink>,
        stats: Arc<ScanStatistics>,
    ) -> Self {
        Self {
            validator,
            sink,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ScanStatistics> {
        &self.stats
    }

    pub async fn process_candidate(
        &self,
        candidate: Candidate,
        allowed: &[String],
    ) -> ValidationResult {
        debug!("Validating {}...", candidate);
        let result = self.validator.validate(&candidate, allowed).await;
        self.stats.record_scanned();

        if !result.valid {
            self.stats.record_invalid();
            return result;
        }

        self.stats.record_valid();
        info!("{} is a valid camera stream", candidate);

        let camera = ValidatedCamera::new(&candidate, &result);
        if let Err(e) = self.sink.save(&camera).await {
            self.stats.record_save_failure();
            error!("Failed to save {}: {}", candidate, e);
        }

        result
    }
}
