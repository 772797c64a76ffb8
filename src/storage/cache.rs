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
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{Storage, StorageError};

/// Wraps another storage and keeps every successful fetch in memory, so instruments that
/// share sample files only fetch them once. Missing data and errors are not cached.
pub struct CachedStorage<S> {
    inner: S,
    cache: Mutex<HashMap<String, Vec<u8>>>,
}

impl<S: Storage> CachedStorage<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of cached identifiers.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns the total size of the cached bytes.
    pub fn cached_bytes(&self) -> usize {
        self.cache.lock().values().map(|b| b.len()).sum()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Storage> Storage for CachedStorage<S> {
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let cached = self.cache.lock().get(id).cloned();
        if let Some(bytes) = cached {
            debug!(id, "Using cached sample bytes");
            return Ok(Some(bytes));
        }

        let fetched = self.inner.fetch(id).await?;
        if let Some(bytes) = &fetched {
            self.cache.lock().insert(id.to_string(), bytes.clone());
        }
        Ok(fetched)
    }
}

impl<S> fmt::Debug for CachedStorage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("CachedStorage")
            .field("cached", &cache.len())
            .field(
                "cached_kb",
                &(cache.values().map(|b| b.len()).sum::<usize>() / 1024),
            )
            .finish()
    }
}
