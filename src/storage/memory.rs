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
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Storage, StorageError};

/// Serves samples from memory. Useful for embedded sample sets and for testing.
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
    fetches: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the bytes under the identifier.
    pub fn insert<S: Into<String>>(&self, id: S, bytes: Vec<u8>) {
        self.files.write().insert(id.into(), bytes);
    }

    /// Returns how many fetches have been made.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<u8>)> for MemoryStorage {
    fn from_iter<T: IntoIterator<Item = (S, Vec<u8>)>>(iter: T) -> Self {
        let storage = MemoryStorage::new();
        for (id, bytes) in iter {
            storage.insert(id, bytes);
        }
        storage
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.read().get(id).cloned())
    }
}
