//! End-to-end acquisition of the crypt_shared library.
//!
//! Composes the pipeline: platform criteria -> catalog lookup ->
//! digest-gated cache/download -> extraction -> install into the project's
//! vendor directory. Strictly sequential; each step consumes the previous
//! step's output.

use crate::catalog::ArtifactRef;
use crate::digest;
use crate::download::{self, ProgressBarObserver};
use crate::error::AcquireError;
use crate::extract::extractor_for;
use crate::listing::Listing;
use crate::output;
use crate::platform::Platform;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Where the library is installed, relative to the project root.
pub const CRYPT_SHARED_DIR: &str = "vendor/crypt_shared";

/// Basename of the shared library inside the downloaded archives.
pub const LIBRARY_BASENAME: &str = "mongo_crypt_v1";

/// Default named sub-artifact to pull out of the catalog.
pub const DEFAULT_ARTIFACT: &str = "crypt_shared";

/// Result of a successful pipeline run.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The library was installed at the given path.
    Installed(PathBuf),
    /// The catalog has no build for this host. Expected for new or niche
    /// platforms; callers should report it and move on, not crash.
    NoBuildForHost,
}

/// The acquisition orchestrator.
pub struct Acquirer {
    platform: Platform,
    listing: Listing,
    cache_dir: PathBuf,
    dest_dir: PathBuf,
    artifact: String,
}

impl Acquirer {
    /// Set up an acquisition into `<project_root>/vendor/crypt_shared`
    /// for the given platform, with default catalog source and cache.
    pub fn new(project_root: impl AsRef<Path>, platform: Platform) -> Self {
        Self {
            platform,
            listing: Listing::default(),
            cache_dir: std::env::temp_dir(),
            dest_dir: project_root.as_ref().join(CRYPT_SHARED_DIR),
            artifact: DEFAULT_ARTIFACT.to_string(),
        }
    }

    /// Use a different catalog listing source.
    pub fn with_listing(mut self, listing: Listing) -> Self {
        self.listing = listing;
        self
    }

    /// Cache downloaded archives somewhere other than the system temp dir.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Install a different named sub-artifact from the catalog.
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = artifact.into();
        self
    }

    /// Run the pipeline.
    pub fn run(&self) -> Result<Outcome, AcquireError> {
        output::action("fetching current MongoDB catalog");
        let catalog = self.listing.fetch()?;

        let Some(artifact) = catalog.optimal_download_for(&self.platform, &self.artifact) else {
            return Ok(Outcome::NoBuildForHost);
        };

        let archive = self.verified_archive(artifact)?;

        std::fs::create_dir_all(&self.dest_dir)?;

        let pattern = Regex::new(&format!(
            r"{LIBRARY_BASENAME}\.{}$",
            self.platform.library_ext()
        ))?;

        let Some(member) = extractor_for(&archive)?.extract(&pattern)? else {
            return Err(AcquireError::MissingArchiveMember {
                pattern: pattern.to_string(),
            });
        };

        // The member keeps its original basename in the vendor directory.
        let file_name = Path::new(&member.name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&member.name));
        let installed = self.dest_dir.join(file_name);

        std::fs::write(&installed, &member.data)?;
        output::success(&format!("installed {}", installed.display()));

        Ok(Outcome::Installed(installed))
    }

    /// Produce a local archive path whose contents verify against the
    /// catalog-declared digest: reuse the cached copy when it verifies,
    /// otherwise (re)download into the same path and verify again. A
    /// download that still mismatches is corrupt and is never reused.
    fn verified_archive(&self, artifact: &ArtifactRef) -> Result<PathBuf, AcquireError> {
        let path = digest::cached_path_for(&self.cache_dir, &artifact.url);

        if path.exists() && digest::verify(&path, &artifact.sha256)? {
            output::detail(&format!("using cached archive {}", path.display()));
            return Ok(path);
        }

        output::detail(&format!("fetching {}", artifact.url));
        let pb = output::create_spinner("downloading");
        let result = download::fetch(&artifact.url, &path, ProgressBarObserver(&pb));
        pb.finish_and_clear();
        result?;

        let actual = digest::sha256_file(&path)?;
        if actual != artifact.sha256.to_lowercase() {
            return Err(AcquireError::CorruptDownload {
                url: artifact.url.clone(),
                expected: artifact.sha256.to_lowercase(),
                actual,
            });
        }

        Ok(path)
    }
}
