//! Acquisition pipeline error types.

use thiserror::Error;

/// Errors that can occur while acquiring the crypt_shared library.
///
/// Each failure mode gets its own variant so callers (and users reading
/// CLI output) can tell "there is no build for my platform" apart from
/// "the download pipeline is broken".
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("cannot install the crypt_shared library for this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error(
        "an uncorrupted crypt_shared library could not be downloaded from {url}\n  expected: {expected}\n  got:      {actual}"
    )]
    CorruptDownload {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("don't know how to extract {0}")]
    UnsupportedArchive(String),

    #[error("no file matching {pattern} could be found in the downloaded archive")]
    MissingArchiveMember { pattern: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip read error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid member pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl AcquireError {
    pub(crate) fn network(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: Box::new(source),
        }
    }
}
