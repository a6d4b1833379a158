use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// One host/port/path combination to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub host: Ipv4Addr,
    pub port: u16,
    pub output_path: String,
}

impl Candidate {
    pub fn new(host: Ipv4Addr, port: u16, output_path: impl Into<String>) -> Self {
        Self {
            host,
            port,
            output_path: output_path.into(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.output_path)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Outcome of validating a single candidate.
///
/// `content_type` is present whenever the first stage got a response, even if
/// the candidate was rejected afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub content_type: Option<String>,
}

impl ValidationResult {
    pub fn invalid(content_type: Option<String>) -> Self {
        Self {
            valid: false,
            content_type,
        }
    }
}

/// Record handed to the result sink for a validated camera.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidatedCamera {
    pub host: Ipv4Addr,
    pub port: u16,
    pub output_path: String,
    pub url: String,
    pub content_type: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

impl ValidatedCamera {
    pub fn new(candidate: &Candidate, result: &ValidationResult) -> Self {
        Self {
            host: candidate.host,
            port: candidate.port,
            output_path: candidate.output_path.clone(),
            url: candidate.url(),
            content_type: result.content_type.clone(),
            discovered_at: Utc::now(),
        }
    }
}
