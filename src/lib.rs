//! # camscan
//!
//! Audits networks you own or are authorized to test for camera video streams
//! that answer without authentication.
//!
//! The scan loop picks a random host inside the configured scope, expands it
//! into every (port, path) candidate, and validates each candidate in its own
//! task. Validation is two-stage: an HTTP request whose content type must be on
//! the allow-list, then a stream-decode check that reads one media unit. Valid
//! cameras are handed to a [`ResultSink`].
//!
//! ## Batching
//!
//! Launched validations accumulate in a buffer. After each host's burst the
//! scheduler compares the buffer to `batch_size`; once it is over, the scheduler
//! waits for every outstanding validation, then logs a summary:
//!
//! ```text
//! Scanned: 4200 | Valid: 3 | Invalid: 4197 | Unique Hosts: 21
//! ```
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "scope": ["192.168.1.0/24"],
//!   "port_range": [8000, 8010],
//!   "output_paths": ["/video.mjpg", "/cam/{index}/stream"],
//!   "content_types": ["image/jpeg", "multipart/x-mixed-replace"],
//!   "batch_size": 1000,
//!   "timeouts": { "connect_timeout_ms": 60000, "read_timeout_ms": 10000 },
//!   "results_path": "cameras.jsonl"
//! }
//! ```
//!
//! The file is re-read at most every `refresh_interval_secs` (default 10) while
//! the scan runs.
//!
//! ## CLI Usage
//!
//! ```bash
//! camscan --config config.json --batch-size 500
//! ```

/// Candidate and validation result types
pub mod candidate;

/// Configuration and settings for the scanner
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Host selection and candidate expansion
pub mod generator;

/// Stream-decode backend for the second probe stage
pub mod decoder;

/// Two-stage candidate validation
pub mod validator;

/// Persistence of validated cameras
pub mod sink;

/// Scan counters
pub mod stats;

/// Per-candidate validation task
pub mod worker;

/// Batch scheduler driving the scan loop
pub mod scheduler;

/// Command-line interface implementation
pub mod cli;

#[cfg(test)]
mod tests;

pub use candidate::*;
pub use cli::*;
pub use config::*;
pub use decoder::*;
pub use error::*;
pub use generator::*;
pub use scheduler::*;
pub use sink::*;
pub use stats::*;
pub use validator::*;
pub use worker::*;
