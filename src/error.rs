use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("HTTP client error: {0}")]
    ClientError(String),

    #[error("Result sink error: {0}")]
    SinkError(String),
}

impl ScanError {
    /// Configuration errors stop the process; everything else is logged and survived.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::ConfigurationError(_) | ScanError::ClientError(_)
        )
    }
}

/// Why a Stage 1 request did not complete.
///
/// These are the expected, high-frequency outcomes of probing a candidate and
/// never leave the validator as errors; they only feed debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("connection failed")]
    Connect,

    #[error("timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("invalid url")]
    InvalidUrl,

    #[error("bad response")]
    Response,
}

impl From<&reqwest::Error> for ProbeFailure {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else if err.is_redirect() {
            ProbeFailure::TooManyRedirects
        } else if err.is_builder() {
            ProbeFailure::InvalidUrl
        } else if err.is_connect() {
            ProbeFailure::Connect
        } else {
            ProbeFailure::Response
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::ClientError(err.to_string())
    }
}
