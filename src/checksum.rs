//! SHA-256 verification of the published files against a `sha256sum`-style
//! manifest. Only run on request; loading never depends on it.

use std::fmt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// One `<hex digest>  <file name>` line of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub sha256: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Match,
    Mismatch { actual: String },
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub expected: String,
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.status == FileStatus::Match
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FileStatus::Match => write!(f, "{}: OK", self.file),
            FileStatus::Mismatch { actual } => write!(
                f,
                "{}: FAILED (expected {}, got {actual})",
                self.file, self.expected
            ),
            FileStatus::Missing => write!(f, "{}: MISSING", self.file),
        }
    }
}

/// Lowercase hex digest, as printed by `sha256sum`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Hash a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, ChecksumError> {
    let bytes = std::fs::read(path).map_err(|source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(sha256_hex(&bytes))
}

/// Parse `sha256sum` output. Blank lines and `#` comments are skipped; a
/// leading `*` on the file name (binary mode) is ignored.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>, ChecksumError> {
    let mut entries = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |message: &str| ChecksumError::Malformed {
            line: i + 1,
            message: message.to_string(),
        };

        let (hash, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| malformed("expected '<sha256>  <file>'"))?;
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(malformed("digest is not 64 hex characters"));
        }
        let file = rest.trim_start();
        let file = file.strip_prefix('*').unwrap_or(file);
        if file.is_empty() {
            return Err(malformed("missing file name"));
        }

        entries.push(ManifestEntry {
            sha256: hash.to_ascii_lowercase(),
            file: file.to_string(),
        });
    }
    Ok(entries)
}

/// Check every entry of `manifest`. File names resolve relative to the
/// manifest's directory.
pub fn verify_manifest(manifest: &Path) -> Result<Vec<FileReport>, ChecksumError> {
    if !manifest.is_file() {
        return Err(ChecksumError::ManifestNotFound(manifest.to_path_buf()));
    }
    let text = std::fs::read_to_string(manifest).map_err(|source| ChecksumError::Io {
        path: manifest.to_path_buf(),
        source,
    })?;
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));

    parse_manifest(&text)?
        .into_iter()
        .map(|entry| {
            let path = base.join(&entry.file);
            let status = if !path.is_file() {
                FileStatus::Missing
            } else {
                let actual = sha256_file(&path)?;
                if actual == entry.sha256 {
                    FileStatus::Match
                } else {
                    FileStatus::Mismatch { actual }
                }
            };
            match &status {
                FileStatus::Match => log::info!("checksum ok: {}", entry.file),
                _ => log::warn!("checksum failed: {} ({status:?})", entry.file),
            }
            Ok(FileReport {
                file: entry.file,
                expected: entry.sha256,
                status,
            })
        })
        .collect()
}
