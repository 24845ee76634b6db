//! Archive module for download mode
//!
//! Downloaded page bodies are gzip-compressed into one file per URL, named
//! `{encoded url}{extension}.gz`. The encoded URL before the first `.` is the
//! file's identifier, which lets a run skip pages archived by earlier runs.

mod content_type;

pub use content_type::extension_for_content_type;

use crate::url::encode_url;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing or scanning the archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan archive directory {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Compression task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Identifiers of pages already present in the archive
///
/// This is a snapshot taken when a download run starts; files written
/// during the run are not added.
#[derive(Debug, Clone, Default)]
pub struct DownloadedIndex {
    ids: HashSet<String>,
}

impl DownloadedIndex {
    pub fn contains_url(&self, url: &str) -> bool {
        self.ids.contains(&encode_url(url))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for DownloadedIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// On-disk archive of downloaded pages
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the archived pages are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the archive file for `url` with the given extension
    pub fn file_path(&self, url: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}{}.gz", encode_url(url), extension))
    }

    /// Collects the identifiers of every archived file
    ///
    /// A missing directory is an empty archive. Identifiers shorter than two
    /// characters cannot come from a URL and are ignored.
    pub fn snapshot(&self) -> Result<DownloadedIndex, ArchiveError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DownloadedIndex::default());
            }
            Err(source) => {
                return Err(ArchiveError::Scan {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut ids = HashSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| ArchiveError::Scan {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let id = name.split('.').next().unwrap_or_default();
            if id.len() < 2 {
                continue;
            }
            ids.insert(id.to_string());
        }

        tracing::debug!("Found {} archived pages in {}", ids.len(), self.dir.display());
        Ok(DownloadedIndex { ids })
    }

    /// Compresses `body` and writes it to the archive file for `url`
    ///
    /// Compression and the write happen on the blocking thread pool.
    pub async fn store(
        &self,
        url: &str,
        extension: &str,
        body: Vec<u8>,
    ) -> Result<PathBuf, ArchiveError> {
        let dir = self.dir.clone();
        let path = self.file_path(url, extension);

        tokio::task::spawn_blocking(move || write_compressed(&dir, &path, &body).map(|_| path))
            .await?
    }
}

fn write_compressed(dir: &Path, path: &Path, body: &[u8]) -> Result<(), ArchiveError> {
    let write_error = |source: std::io::Error| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_error)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).map_err(write_error)?;
    let compressed = encoder.finish().map_err(write_error)?;

    std::fs::write(path, compressed).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_snapshot_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path().join("nothing-here"));
        assert!(archive.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_collects_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path());

        let id = encode_url("http://example.com/a");
        std::fs::write(dir.path().join(format!("{}.html.gz", id)), b"x").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"x").unwrap();

        let index = archive.snapshot().unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains_url("http://example.com/a"));
        assert!(!index.contains_url("http://example.com/b"));
    }

    #[tokio::test]
    async fn test_store_writes_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path().join("downloaded"));

        let path = archive
            .store("http://example.com/a", ".html", b"<html>hi</html>".to_vec())
            .await
            .unwrap();

        assert_eq!(path, archive.file_path("http://example.com/a", ".html"));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".html.gz"));

        let mut decoded = String::new();
        GzDecoder::new(std::fs::File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "<html>hi</html>");

        // Files written by a run show up in the next snapshot
        assert!(archive.snapshot().unwrap().contains_url("http://example.com/a"));
    }

    #[tokio::test]
    async fn test_store_into_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let archive = Archive::new(blocker.join("downloaded"));
        let result = archive
            .store("http://example.com/a", ".html", b"body".to_vec())
            .await;
        assert!(matches!(result, Err(ArchiveError::Write { .. })));
    }
}
