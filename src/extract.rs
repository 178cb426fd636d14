//! Pulls a single named member out of a downloaded archive.
//!
//! The crypt_shared archives come in two container formats depending on
//! platform: zip (Windows) and gzip-compressed tar (everything else).
//! Both variants expose the same contract: scan members in container
//! order, stop at the first whose path matches the pattern, and hand back
//! its name and full contents. "No match" is a normal `None`, not an
//! error — the caller decides how bad that is.

use crate::error::AcquireError;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Name and raw contents of the one archive member that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember {
    pub name: String,
    pub data: Vec<u8>,
}

/// Format-polymorphic member extraction.
pub trait Extract: std::fmt::Debug {
    /// Return the first member whose full path matches `pattern`, or
    /// `None` when nothing in the archive matches. Scanning stops at the
    /// first match.
    fn extract(&mut self, pattern: &Regex) -> Result<Option<ExtractedMember>, AcquireError>;
}

/// Pick the extractor variant for an archive, keyed on file extension.
///
/// Unrecognized extensions fail here, before any bytes are read.
pub fn extractor_for(archive_path: &Path) -> Result<Box<dyn Extract>, AcquireError> {
    let name = archive_path.to_string_lossy().to_lowercase();

    if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
        Ok(Box::new(TarGzipExtractor::new(archive_path)))
    } else if name.ends_with(".zip") {
        Ok(Box::new(ZipExtractor::open(archive_path)?))
    } else {
        Err(AcquireError::UnsupportedArchive(
            archive_path.display().to_string(),
        ))
    }
}

/// Extractor for .zip archives.
#[derive(Debug)]
pub struct ZipExtractor {
    archive: zip::ZipArchive<File>,
}

impl ZipExtractor {
    pub fn open(archive_path: &Path) -> Result<Self, AcquireError> {
        let file = File::open(archive_path)?;
        Ok(Self {
            archive: zip::ZipArchive::new(file)?,
        })
    }
}

impl Extract for ZipExtractor {
    fn extract(&mut self, pattern: &Regex) -> Result<Option<ExtractedMember>, AcquireError> {
        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index)?;
            let name = entry.name().to_string();
            if !pattern.is_match(&name) {
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            return Ok(Some(ExtractedMember { name, data }));
        }

        Ok(None)
    }
}

/// Extractor for .tgz/.tar.gz archives.
#[derive(Debug)]
pub struct TarGzipExtractor {
    archive_path: PathBuf,
}

impl TarGzipExtractor {
    pub fn new(archive_path: &Path) -> Self {
        Self {
            archive_path: archive_path.to_path_buf(),
        }
    }
}

impl Extract for TarGzipExtractor {
    fn extract(&mut self, pattern: &Regex) -> Result<Option<ExtractedMember>, AcquireError> {
        let file = File::open(&self.archive_path)?;
        let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
        let mut archive = tar::Archive::new(decoder);

        for entry in archive.entries()? {
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            if !pattern.is_match(&name) {
                continue;
            }

            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            return Ok(Some(ExtractedMember { name, data }));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Build a .tgz archive from (path, contents) pairs.
    fn build_tgz(dest: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(dest).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, content) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *content).unwrap();
        }

        let encoder = builder.into_inner().unwrap();
        encoder.finish().unwrap();
    }

    /// Build a .zip archive from (path, contents) pairs.
    fn build_zip(dest: &Path, members: &[(&str, &[u8])]) {
        let file = File::create(dest).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        for (path, content) in members {
            zip.start_file(*path, options).unwrap();
            zip.write_all(content).unwrap();
        }

        zip.finish().unwrap();
    }

    #[test]
    fn test_tgz_extracts_matching_member() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.tgz");
        build_tgz(
            &archive,
            &[
                ("foo/readme.md", b"docs"),
                ("foo/bar/bar.txt", b"payload bytes"),
            ],
        );

        let pattern = Regex::new(r"bar\.txt$").unwrap();
        let member = extractor_for(&archive)
            .unwrap()
            .extract(&pattern)
            .unwrap()
            .unwrap();

        assert_eq!(member.name, "foo/bar/bar.txt");
        assert_eq!(member.data, b"payload bytes");
    }

    #[test]
    fn test_zip_extracts_matching_member() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.zip");
        build_zip(
            &archive,
            &[
                ("foo/readme.md", b"docs"),
                ("foo/bar/bar.txt", b"payload bytes"),
            ],
        );

        let pattern = Regex::new(r"bar\.txt$").unwrap();
        let member = extractor_for(&archive)
            .unwrap()
            .extract(&pattern)
            .unwrap()
            .unwrap();

        assert_eq!(member.name, "foo/bar/bar.txt");
        assert_eq!(member.data, b"payload bytes");
    }

    #[test]
    fn test_no_match_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let tgz = dir.path().join("test.tgz");
        let zip_path = dir.path().join("test.zip");
        build_tgz(&tgz, &[("foo/bar/bar.txt", b"x")]);
        build_zip(&zip_path, &[("foo/bar/bar.txt", b"x")]);

        let pattern = Regex::new(r"quux\.dylib$").unwrap();
        assert!(extractor_for(&tgz).unwrap().extract(&pattern).unwrap().is_none());
        assert!(
            extractor_for(&zip_path)
                .unwrap()
                .extract(&pattern)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.tar.gz");
        build_tgz(
            &archive,
            &[
                ("a/lib.so", b"first"),
                ("b/lib.so", b"second"),
            ],
        );

        let pattern = Regex::new(r"lib\.so$").unwrap();
        let member = extractor_for(&archive)
            .unwrap()
            .extract(&pattern)
            .unwrap()
            .unwrap();

        assert_eq!(member.name, "a/lib.so");
        assert_eq!(member.data, b"first");
    }

    #[test]
    fn test_unrecognized_extension_fails_at_selection() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.tar.xz");
        std::fs::write(&archive, b"whatever").unwrap();

        let err = extractor_for(&archive).unwrap_err();
        assert!(matches!(err, AcquireError::UnsupportedArchive(_)));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("TEST.ZIP");
        build_zip(&archive, &[("a.txt", b"x")]);

        assert!(extractor_for(&archive).is_ok());
    }
}
