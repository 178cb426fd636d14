//! Fetches the catalog listing, with an on-disk cache.
//!
//! The remote listing changes rarely, so the raw JSON bytes of the last
//! successful fetch are kept in a well-known cache file and reused for 24
//! hours (gated on the file's mtime). A required refresh that fails is an
//! error; a stale cache is never served as a fallback.

use crate::catalog::Catalog;
use crate::error::AcquireError;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// The URI of the current.json catalog.
pub const CURRENT_URL: &str = "https://downloads.mongodb.org/current.json";

/// Name of the cache file, placed in the system temp directory by default.
pub const CACHE_FILE_NAME: &str = ".current.json";

/// How old the cache may be before it must be fetched again.
const CACHE_CUTOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Bound on the catalog fetch. The original had none; added defensively.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A catalog listing source: remote URL plus local cache file.
pub struct Listing {
    url: String,
    cache_path: PathBuf,
}

impl Default for Listing {
    fn default() -> Self {
        Self::new(CURRENT_URL, std::env::temp_dir().join(CACHE_FILE_NAME))
    }
}

impl Listing {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
        }
    }

    /// Return the current catalog, from cache when fresh, otherwise from
    /// the network (refreshing the cache as a side effect).
    pub fn fetch(&self) -> Result<Catalog, AcquireError> {
        if let Some(bytes) = self.read_cache()? {
            return Catalog::parse(&bytes);
        }

        let bytes = self.refresh()?;
        Catalog::parse(&bytes)
    }

    /// Read the cache file if it exists and is within the freshness window.
    fn read_cache(&self) -> Result<Option<Vec<u8>>, AcquireError> {
        let Ok(metadata) = std::fs::metadata(&self.cache_path) else {
            return Ok(None);
        };
        let mtime = metadata.modified()?;

        // An mtime in the future counts as fresh (age zero).
        let age = SystemTime::now()
            .duration_since(mtime)
            .unwrap_or(Duration::ZERO);
        if age >= CACHE_CUTOFF {
            return Ok(None);
        }

        Ok(Some(std::fs::read(&self.cache_path)?))
    }

    /// Fetch the listing from the server and overwrite the cache file,
    /// returning the raw bytes.
    fn refresh(&self) -> Result<Vec<u8>, AcquireError> {
        let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
        let response = agent
            .get(&self.url)
            .call()
            .map_err(|e| AcquireError::network(&self.url, e))?;

        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;

        // Replace the cache atomically so a concurrent reader never sees a
        // torn file.
        let dir = self
            .cache_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.cache_path).map_err(|e| e.error)?;

        Ok(bytes)
    }
}
