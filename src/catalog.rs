//! Queryable view over the MongoDB download catalog.
//!
//! The catalog is a JSON document listing versions, each with per-platform
//! downloads. Records are modeled as explicit structs with the known
//! attribute keys; anything else in the document is ignored. Criteria
//! match conjunctively and by exact equality, and iteration keeps document
//! order — the catalog lists preferred (newest) builds first, so "first
//! match" is the selection rule.

use crate::error::AcquireError;
use crate::platform::Platform;
use serde::Deserialize;

/// The remote location and expected content hash of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactRef {
    pub url: String,
    pub sha256: String,
}

/// One platform-specific download inside a version entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadEntry {
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(default)]
    pub archive: Option<ArtifactRef>,
    #[serde(default)]
    pub crypt_shared: Option<ArtifactRef>,
}

impl DownloadEntry {
    /// Look up a named sub-artifact of this download.
    pub fn artifact(&self, which: &str) -> Option<&ArtifactRef> {
        match which {
            "crypt_shared" => self.crypt_shared.as_ref(),
            "archive" => self.archive.as_ref(),
            _ => None,
        }
    }
}

/// One released version and its downloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionEntry {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub production_release: Option<bool>,
    #[serde(default)]
    pub development_release: Option<bool>,
    #[serde(default)]
    pub lts_release: Option<bool>,
    #[serde(default)]
    pub downloads: Vec<DownloadEntry>,
}

/// Root of the fetched catalog JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDocument {
    pub versions: Vec<VersionEntry>,
}

/// Version-level selection criteria. `None` means "don't care"; a `Some`
/// criterion against an entry that lacks the key fails the match.
#[derive(Debug, Clone, Default)]
pub struct VersionCriteria {
    pub version: Option<String>,
    pub production_release: Option<bool>,
    pub development_release: Option<bool>,
    pub lts_release: Option<bool>,
}

/// Download-level selection criteria.
#[derive(Debug, Clone, Default)]
pub struct DownloadCriteria {
    pub arch: Option<String>,
    pub target: Option<String>,
    pub edition: Option<String>,
}

/// Exact-equality test for one criterion against one record attribute.
fn criterion_matches<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
    match want {
        None => true,
        Some(value) => have.as_ref() == Some(value),
    }
}

impl VersionCriteria {
    fn matches(&self, entry: &VersionEntry) -> bool {
        criterion_matches(&self.version, &entry.version)
            && criterion_matches(&self.production_release, &entry.production_release)
            && criterion_matches(&self.development_release, &entry.development_release)
            && criterion_matches(&self.lts_release, &entry.lts_release)
    }
}

impl DownloadCriteria {
    fn matches(&self, entry: &DownloadEntry) -> bool {
        criterion_matches(&self.arch, &entry.arch)
            && criterion_matches(&self.target, &entry.target)
            && criterion_matches(&self.edition, &entry.edition)
    }
}

/// An in-memory queryable catalog.
#[derive(Debug)]
pub struct Catalog {
    document: CatalogDocument,
}

impl Catalog {
    pub fn new(document: CatalogDocument) -> Self {
        Self { document }
    }

    /// Parse a catalog from raw JSON bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, AcquireError> {
        Ok(Self::new(serde_json::from_slice(bytes)?))
    }

    /// Yield every download whose version entry satisfies `versions` and
    /// whose own attributes satisfy `downloads`, in document order.
    pub fn query<'a>(
        &'a self,
        versions: &VersionCriteria,
        downloads: &DownloadCriteria,
    ) -> impl Iterator<Item = &'a DownloadEntry> {
        let versions = versions.clone();
        let downloads = downloads.clone();
        self.document
            .versions
            .iter()
            .filter(move |version| versions.matches(version))
            .flat_map(|version| version.downloads.iter())
            .filter(move |download| downloads.matches(download))
    }

    /// The named artifact from the first production-release download that
    /// matches the platform, or `None` when the catalog has no build for
    /// this host. `None` is an expected outcome, not a failure.
    pub fn optimal_download_for(&self, platform: &Platform, which: &str) -> Option<&ArtifactRef> {
        let versions = VersionCriteria {
            production_release: Some(true),
            ..VersionCriteria::default()
        };
        let downloads = platform.download_criteria();

        self.query(&versions, &downloads)
            .next()
            .and_then(|download| download.artifact(which))
    }
}
