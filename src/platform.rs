//! Host platform detection.
//!
//! Derives the normalized (arch, target, edition) criteria used to pick a
//! download out of the catalog. The catalog names targets `"windows"`,
//! `"macos"`, or a concatenated Linux distro id and version number
//! (`"ubuntu2204"`, `"rhel90"`, ...), so Linux hosts are classified from
//! `/etc/os-release`.

use crate::catalog::DownloadCriteria;
use crate::error::AcquireError;

/// The catalog edition that carries the crypt_shared library.
pub const EDITION: &str = "enterprise";

/// Location of the os-release metadata on Linux hosts.
const OS_RELEASE_PATH: &str = "/etc/os-release";

/// The host operating system, as far as the catalog cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux { distro: String, version: String },
    Unsupported,
}

impl HostOs {
    /// Classify the current host.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            match std::fs::read_to_string(OS_RELEASE_PATH)
                .ok()
                .as_deref()
                .and_then(parse_os_release)
            {
                Some((distro, version)) => Self::Linux { distro, version },
                None => Self::Unsupported,
            }
        } else {
            Self::Unsupported
        }
    }

    /// The catalog's `target` identifier for this OS, if it has one.
    pub fn target(&self) -> Option<String> {
        match self {
            Self::Windows => Some("windows".to_string()),
            Self::MacOs => Some("macos".to_string()),
            Self::Linux { distro, version } => Some(format!("{distro}{version}")),
            Self::Unsupported => None,
        }
    }

    /// Filename extension of native shared libraries on this OS.
    pub fn library_ext(&self) -> Option<&'static str> {
        match self {
            Self::Windows => Some("dll"),
            Self::MacOs => Some("dylib"),
            Self::Linux { .. } => Some("so"),
            Self::Unsupported => None,
        }
    }
}

/// The (arch, target, edition) triple used to select a catalog download.
#[derive(Debug, Clone)]
pub struct Platform {
    pub arch: String,
    pub target: String,
    pub os: HostOs,
}

impl Platform {
    /// Build a platform descriptor for an explicit arch and OS.
    ///
    /// Fails with `UnsupportedPlatform` when the OS has no catalog target.
    pub fn new(arch: impl Into<String>, os: HostOs) -> Result<Self, AcquireError> {
        let target = os.target().ok_or_else(|| {
            AcquireError::UnsupportedPlatform(std::env::consts::OS.to_string())
        })?;

        Ok(Self {
            arch: arch.into(),
            target,
            os,
        })
    }

    /// Build the platform descriptor for the current host.
    pub fn detect() -> Result<Self, AcquireError> {
        let os = HostOs::detect();
        Self::new(catalog_arch(&os), os)
    }

    /// The download-level criteria this platform matches against.
    pub fn download_criteria(&self) -> DownloadCriteria {
        DownloadCriteria {
            arch: Some(self.arch.clone()),
            target: Some(self.target.clone()),
            edition: Some(EDITION.to_string()),
        }
    }

    /// Extension of the shared library to pull out of the archive.
    pub fn library_ext(&self) -> &'static str {
        // `new` rejects Unsupported, so an extension always exists here.
        self.os.library_ext().unwrap_or("so")
    }
}

/// Map the compile-time CPU family onto the catalog's arch names.
///
/// The catalog lists Apple silicon as `arm64` but 64-bit ARM Linux as
/// `aarch64`.
fn catalog_arch(os: &HostOs) -> String {
    match (std::env::consts::ARCH, os) {
        ("aarch64", HostOs::MacOs) => "arm64".to_string(),
        (arch, _) => arch.to_string(),
    }
}

/// Pull the distro id and normalized version number out of os-release text.
///
/// The version keeps digits only (`"22.04"` becomes `"2204"`), matching how
/// the catalog spells Linux targets.
fn parse_os_release(text: &str) -> Option<(String, String)> {
    let id = os_release_value(text, "ID")?;
    let version_id = os_release_value(text, "VERSION_ID")?;
    let version: String = version_id.chars().filter(char::is_ascii_digit).collect();

    Some((id, version))
}

/// Read one `KEY=value` entry from os-release text, dropping quotes.
fn os_release_value(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        if k.trim() != key {
            return None;
        }
        Some(v.trim().trim_matches('"').trim_matches('\'').to_string())
    })
}
