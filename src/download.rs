//! Streaming artifact download.
//!
//! Streams the response body to disk in fixed-size chunks so that peak
//! memory stays bounded no matter how large the archive is. A failed fetch
//! leaves a partial file behind; callers treat anything that fails digest
//! verification as invalid and re-fetch from scratch.

use crate::error::AcquireError;
use crate::output;
use indicatif::ProgressBar;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Read/write chunk size for streaming downloads.
const CHUNK_SIZE: usize = 8192;

/// Bound on the whole artifact download. The original had none; added
/// defensively.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Observer for download progress.
pub trait FetchProgress {
    /// The total size, when the server reports a content length.
    fn content_length(&mut self, _total: u64) {}

    /// Cumulative bytes received so far, reported once per chunk.
    fn chunk(&mut self, _cumulative: u64) {}
}

/// Plain closures observe the cumulative byte count only.
impl<F: FnMut(u64)> FetchProgress for F {
    fn chunk(&mut self, cumulative: u64) {
        self(cumulative)
    }
}

/// Drives an indicatif bar: starts as a spinner, upgrades to a byte bar
/// once the content length is known.
pub struct ProgressBarObserver<'a>(pub &'a ProgressBar);

impl FetchProgress for ProgressBarObserver<'_> {
    fn content_length(&mut self, total: u64) {
        output::upgrade_to_bytes(self.0, total);
    }

    fn chunk(&mut self, cumulative: u64) {
        self.0.set_position(cumulative);
    }
}

/// Stream `url` into `dest`, reporting progress per chunk. Returns the
/// total number of bytes written.
pub fn fetch(
    url: &str,
    dest: &Path,
    mut progress: impl FetchProgress,
) -> Result<u64, AcquireError> {
    let response = artifact_agent()?
        .get(url)
        .call()
        .map_err(|e| AcquireError::network(url, e))?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        progress.content_length(len);
    }

    let mut file = std::fs::File::create(dest)?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        total_bytes += bytes_read as u64;
        progress.chunk(total_bytes);
        file.write_all(&buffer[..bytes_read])?;
    }

    Ok(total_bytes)
}

/// HTTP agent for artifact downloads.
///
/// Certificate verification is deliberately relaxed here, mirroring the
/// upstream tool: the artifact's integrity is checked against the
/// catalog-declared sha256 after download, and that digest comparison is
/// the actual trust boundary. Revisit if the hosting arrangement changes.
fn artifact_agent() -> Result<ureq::Agent, AcquireError> {
    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(std::io::Error::other)?;

    Ok(ureq::AgentBuilder::new()
        .timeout(DOWNLOAD_TIMEOUT)
        .tls_connector(Arc::new(tls))
        .build())
}
