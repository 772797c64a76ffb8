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

//! Storage backends that fetch the raw bytes of a sample by identifier.

mod cache;
mod error;
mod file;
mod http;
mod memory;

use async_trait::async_trait;

pub use cache::CachedStorage;
pub use error::StorageError;
pub use file::FileStorage;
pub use http::{is_network_id, HttpStorage};
pub use memory::MemoryStorage;

/// Fetches raw sample bytes for an identifier (typically a path or URL).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns the bytes for the identifier, `Ok(None)` if there is no data for it, or an
    /// error if the fetch failed.
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// The storage used when none is configured: URLs are fetched over HTTP and everything
/// else is read from disk.
#[derive(Clone, Debug, Default)]
pub struct DefaultStorage {
    file: FileStorage,
    http: HttpStorage,
}

impl DefaultStorage {
    pub fn new(file: FileStorage, http: HttpStorage) -> Self {
        Self { file, http }
    }

    pub fn file(&self) -> &FileStorage {
        &self.file
    }

    pub fn http(&self) -> &HttpStorage {
        &self.http
    }
}

#[async_trait]
impl Storage for DefaultStorage {
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if is_network_id(id) {
            self.http.fetch(id).await
        } else {
            self.file.fetch(id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_http;

    #[tokio::test]
    async fn test_default_storage_routes_by_scheme() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("kick.wav"), b"disk")?;
        let base_url = serve_http(vec![("/snare.wav", b"web".to_vec())]).await;

        let http = HttpStorage::new().with_client(reqwest::Client::builder().no_proxy().build()?);
        let storage = DefaultStorage::new(FileStorage::new(dir.path()), http);

        assert_eq!(storage.fetch("kick.wav").await?, Some(b"disk".to_vec()));
        assert_eq!(
            storage.fetch(&format!("{}/snare.wav", base_url)).await?,
            Some(b"web".to_vec())
        );
        assert_eq!(storage.fetch(&format!("{}/hat.wav", base_url)).await?, None);
        Ok(())
    }
}
