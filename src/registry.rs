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
use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::{AudioBuffer, AudioBuffers};
use crate::key::SampleKey;

/// The key to buffer mapping read by the playback engine.
///
/// This is a cheap, cloneable handle: every clone refers to the same registry. The load
/// pipeline writes into it from many tasks at once, and a custom loader receives a handle
/// as its only way of populating the instrument. Writes to the same key are last-writer-wins.
#[derive(Clone, Default)]
pub struct BufferRegistry {
    entries: Arc<RwLock<HashMap<SampleKey, AudioBuffers>>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the buffers under the given key, returning the previous entry.
    pub fn insert<K, B>(&self, key: K, buffers: B) -> Option<AudioBuffers>
    where
        K: Into<SampleKey>,
        B: Into<AudioBuffers>,
    {
        self.entries.write().insert(key.into(), buffers.into())
    }

    /// Returns the entry for the given key.
    pub fn get<K: Into<SampleKey>>(&self, key: K) -> Option<AudioBuffers> {
        self.entries.read().get(&key.into()).cloned()
    }

    /// Returns the buffer at the given round-robin position for the given key.
    pub fn buffer<K: Into<SampleKey>>(&self, key: K, index: usize) -> Option<AudioBuffer> {
        self.entries
            .read()
            .get(&key.into())
            .and_then(|entry| entry.get(index).cloned())
    }

    pub fn contains<K: Into<SampleKey>>(&self, key: K) -> bool {
        self.entries.read().contains_key(&key.into())
    }

    pub fn remove<K: Into<SampleKey>>(&self, key: K) -> Option<AudioBuffers> {
        self.entries.write().remove(&key.into())
    }

    /// Returns all keys, sorted.
    pub fn keys(&self) -> Vec<SampleKey> {
        let mut keys: Vec<SampleKey> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the memory used by every buffer in the registry.
    pub fn memory_size(&self) -> usize {
        self.entries
            .read()
            .values()
            .map(|entry| match entry {
                AudioBuffers::Single(buffer) => buffer.memory_size(),
                AudioBuffers::Group(group) => group.values().map(|b| b.memory_size()).sum(),
            })
            .sum()
    }
}

impl fmt::Debug for BufferRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRegistry")
            .field("entries", &self.len())
            .field("memory_kb", &(self.memory_size() / 1024))
            .finish()
    }
}
