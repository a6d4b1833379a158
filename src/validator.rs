//! Two-stage candidate validation
//!
//! Stage 1 is a plain HTTP request whose declared content type must be on the
//! allow-list. Stage 2 hands the URL to a [`StreamDecoder`] and requires one
//! media unit to come back. Stage 2 only runs when stage 1 passed; neither stage
//! lets a failure escape as an error.

use crate::{Candidate, ProbeFailure, ScanError, StreamDecoder, Timeouts, ValidationResult};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::debug;

/// Media type used when a response carries no content type header.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Result of the first stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentProbe {
    pub accepted: bool,
    pub content_type: Option<String>,
    pub failure: Option<ProbeFailure>,
}

impl ContentProbe {
    fn failed(failure: ProbeFailure) -> Self {
        Self {
            accepted: false,
            content_type: None,
            failure: Some(failure),
        }
    }
}

pub struct Validator {
    client: reqwest::Client,
    decoder: Arc<dyn StreamDecoder>,
    timeouts: Timeouts,
}

impl Validator {
    pub fn new(timeouts: &Timeouts, decoder: Arc<dyn StreamDecoder>) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .build()?;

        Ok(Self {
            client,
            decoder,
            timeouts: timeouts.clone(),
        })
    }

    /// Decide whether `candidate` is a live, unauthenticated stream.
    pub async fn validate(&self, candidate: &Candidate, allowed: &[String]) -> ValidationResult {
        let url = candidate.url();

        let probe = self.probe_content(&url, allowed).await;
        if !probe.accepted {
            match probe.failure {
                Some(failure) => debug!("{} rejected: {}", url, failure),
                None => debug!("{} rejected: content type {:?}", url, probe.content_type),
            }
            return ValidationResult::invalid(probe.content_type);
        }

        let valid = self.probe_stream(&url).await;
        if !valid {
            debug!("{} rejected: no decodable stream", url);
        }

        ValidationResult {
            valid,
            content_type: probe.content_type,
        }
    }

    /// Stage 1: request the URL and check its declared content type.
    pub async fn probe_content(&self, url: &str, allowed: &[String]) -> ContentProbe {
        let request = self.client.get(url).send();
        let response = match timeout(self.timeouts.response(), request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return ContentProbe::failed(ProbeFailure::from(&e)),
            Err(_) => return ContentProbe::failed(ProbeFailure::Timeout),
        };

        let content_type = media_type(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        let accepted = allowed
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&content_type));

        ContentProbe {
            accepted,
            content_type: Some(content_type),
            failure: None,
        }
    }

    /// Stage 2: open the stream and read one unit from it.
    pub async fn probe_stream(&self, url: &str) -> bool {
        match self.decoder.open(url).await {
            Some(mut handle) => self.decoder.read_one_unit(&mut handle).await,
            None => false,
        }
    }
}

/// Media type of a `Content-Type` header value, without parameters.
pub fn media_type(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
