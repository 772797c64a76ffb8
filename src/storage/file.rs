// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{Storage, StorageError};

const FILE_SCHEME: &str = "file://";

/// Reads samples from the local filesystem.
///
/// Identifiers are paths, optionally prefixed with `file://`. Relative paths are resolved
/// against the root if one is set, otherwise against the working directory.
#[derive(Clone, Debug, Default)]
pub struct FileStorage {
    root: Option<PathBuf>,
}

impl FileStorage {
    /// Creates a file storage rooted at the given directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolves an identifier to a path on disk.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, StorageError> {
        let path = match id.strip_prefix(FILE_SCHEME) {
            Some(path) => path,
            None if id.contains("://") => {
                return Err(StorageError::UnsupportedScheme(id.to_string()))
            }
            None => id,
        };

        let path = Path::new(path);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = ?path, bytes = bytes.len(), "Read sample file");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                id: id.to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let storage = FileStorage::new("/samples");
        assert_eq!(
            storage.resolve("kick.wav").unwrap(),
            PathBuf::from("/samples/kick.wav")
        );
        assert_eq!(
            storage.resolve("file:///other/snare.wav").unwrap(),
            PathBuf::from("/other/snare.wav")
        );
        assert_eq!(
            FileStorage::default().resolve("file://hat.wav").unwrap(),
            PathBuf::from("hat.wav")
        );
    }

    #[tokio::test]
    async fn test_rejects_network_identifiers() {
        let storage = FileStorage::default();
        assert!(matches!(
            storage.fetch("https://example.com/kick.wav").await,
            Err(StorageError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("kick.wav"), b"data")?;
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.fetch("kick.wav").await?, Some(b"data".to_vec()));
        assert_eq!(storage.fetch("missing.wav").await?, None);
        Ok(())
    }
}
