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
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::sync::OnceCell;
use tracing::debug;

use super::{Storage, StorageError};

/// Returns true if the identifier is an `http://` or `https://` URL.
pub fn is_network_id(id: &str) -> bool {
    id.starts_with("http://") || id.starts_with("https://")
}

/// Fetches samples over HTTP.
///
/// Identifiers are absolute URLs, or paths relative to the base URL if one is set. A
/// 404 means there is no data for the identifier.
#[derive(Clone, Debug, Default)]
pub struct HttpStorage {
    base_url: Option<String>,
    client: OnceCell<Client>,
}

impl HttpStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative identifiers against the given URL.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Uses the given client instead of building one on the first fetch.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = OnceCell::new_with(Some(client));
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Resolves an identifier to a URL.
    pub fn resolve(&self, id: &str) -> Result<String, StorageError> {
        if is_network_id(id) {
            return Ok(id.to_string());
        }
        match &self.base_url {
            Some(base_url) if !id.contains("://") => Ok(format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                id.trim_start_matches('/')
            )),
            _ => Err(StorageError::UnsupportedScheme(id.to_string())),
        }
    }

    async fn client(&self, id: &str) -> Result<&Client, StorageError> {
        self.client
            .get_or_try_init(|| async { Client::builder().build() })
            .await
            .map_err(|e| StorageError::Http {
                id: id.to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl Storage for HttpStorage {
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let url = self.resolve(id)?;
        let http_error = |source: reqwest::Error| StorageError::Http {
            id: id.to_string(),
            source,
        };

        let response = self
            .client(id)
            .await?
            .get(&url)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Sample not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_error)?;
        debug!(url = %url, bytes = bytes.len(), "Downloaded sample");
        Ok(Some(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_http;

    fn storage(base_url: &str) -> HttpStorage {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpStorage::new()
            .with_base_url(format!("{}/samples", base_url))
            .with_client(client)
    }

    #[test]
    fn test_resolve() {
        let storage = HttpStorage::new().with_base_url("https://cdn.example.com/kit/");
        assert_eq!(
            storage.resolve("kick.wav").unwrap(),
            "https://cdn.example.com/kit/kick.wav"
        );
        assert_eq!(
            storage.resolve("http://other.example.com/snare.wav").unwrap(),
            "http://other.example.com/snare.wav"
        );
        assert!(matches!(
            storage.resolve("file:///hat.wav"),
            Err(StorageError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            HttpStorage::new().resolve("kick.wav"),
            Err(StorageError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch() {
        let base_url = serve_http(vec![("/samples/kick.wav", b"kick".to_vec())]).await;
        let storage = storage(&base_url);

        assert_eq!(storage.fetch("kick.wav").await.unwrap(), Some(b"kick".to_vec()));
        assert_eq!(
            storage
                .fetch(&format!("{}/samples/kick.wav", base_url))
                .await
                .unwrap(),
            Some(b"kick".to_vec())
        );
        assert_eq!(storage.fetch("missing.wav").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_errors() {
        let base_url = serve_http(Vec::new()).await;
        let storage = storage(&base_url);

        assert!(matches!(
            storage.fetch(&format!("{}/error.wav", base_url)).await,
            Err(StorageError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_errors() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(matches!(
            storage(&base_url).fetch("kick.wav").await,
            Err(StorageError::Http { .. })
        ));
    }
}
