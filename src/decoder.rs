//! Stream-decode backend used by the second probe stage.
//!
//! The validator only needs to know whether a stream can be opened and yields
//! at least one media unit. [`HttpStreamDecoder`] answers that by streaming the
//! body and looking for a known container or frame signature.

use crate::{ScanError, Timeouts};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Bytes inspected before giving up on finding a media unit.
pub const MAX_SNIFF_BYTES: usize = 256 * 1024;

/// An opened stream.
pub struct StreamHandle {
    response: Option<reqwest::Response>,
    buffered: Vec<u8>,
}

impl StreamHandle {
    pub fn from_response(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
            buffered: Vec::new(),
        }
    }

    /// A handle over bytes that are already in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            response: None,
            buffered: bytes.into(),
        }
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buffered
    }

    /// Pull the next body chunk into the buffer. `false` on end of stream,
    /// read error or timeout.
    async fn fill(&mut self, read_timeout: Duration) -> bool {
        let Some(response) = self.response.as_mut() else {
            return false;
        };

        match timeout(read_timeout, response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                self.buffered.extend_from_slice(&chunk);
                true
            }
            Ok(Ok(None)) => false,
            Ok(Err(e)) => {
                debug!("Stream read failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Stream read timed out after {:?}", read_timeout);
                false
            }
        }
    }
}

/// Opens streams and reads single units from them. Errors are failures, never panics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamDecoder: Send + Sync {
    /// `None` when the stream cannot be opened.
    async fn open(&self, url: &str) -> Option<StreamHandle>;

    async fn read_one_unit(&self, handle: &mut StreamHandle) -> bool;
}

/// Media units recognised at the start of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaUnit {
    Jpeg,
    MpegTs,
    Mp4,
    Flv,
    H264,
}

const TS_PACKET_LEN: usize = 188;

/// Find the first recognisable media unit in `bytes`.
pub fn find_media_unit(bytes: &[u8]) -> Option<MediaUnit> {
    if bytes.starts_with(b"FLV") {
        return Some(MediaUnit::Flv);
    }
    if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
        return Some(MediaUnit::Mp4);
    }
    if bytes.len() > TS_PACKET_LEN && bytes[0] == 0x47 && bytes[TS_PACKET_LEN] == 0x47 {
        return Some(MediaUnit::MpegTs);
    }
    // MJPEG streams usually carry a multipart preamble before the first frame.
    if bytes.windows(3).any(|w| w == [0xFF, 0xD8, 0xFF]) {
        return Some(MediaUnit::Jpeg);
    }
    // Annex-B start code followed by a slice, IDR or SPS NAL unit.
    if bytes
        .windows(5)
        .any(|w| w[..4] == [0, 0, 0, 1] && matches!(w[4] & 0x1F, 1 | 5 | 7))
    {
        return Some(MediaUnit::H264);
    }

    None
}

/// Decoder that opens the stream over HTTP and sniffs the first unit.
pub struct HttpStreamDecoder {
    client: reqwest::Client,
    timeouts: Timeouts,
}

impl HttpStreamDecoder {
    pub fn new(timeouts: &Timeouts) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .build()?;

        Ok(Self {
            client,
            timeouts: timeouts.clone(),
        })
    }
}

#[async_trait]
impl StreamDecoder for HttpStreamDecoder {
    async fn open(&self, url: &str) -> Option<StreamHandle> {
        let response = match timeout(self.timeouts.response(), self.client.get(url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!("Cannot open stream {}: {}", url, e);
                return None;
            }
            Err(_) => {
                debug!("Opening stream {} timed out", url);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Stream {} answered {}", url, response.status());
            return None;
        }

        Some(StreamHandle::from_response(response))
    }

    async fn read_one_unit(&self, handle: &mut StreamHandle) -> bool {
        loop {
            if let Some(unit) = find_media_unit(handle.buffered()) {
                debug!("Found {:?} unit", unit);
                return true;
            }
            if handle.buffered().len() >= MAX_SNIFF_BYTES {
                return false;
            }
            if !handle.fill(self.timeouts.read()).await {
                return false;
            }
        }
    }
}
