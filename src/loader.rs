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

//! Asynchronous loading of samples into a buffer registry.

mod error;
mod spec;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

pub use error::{LoadError, SkipReason};
pub use spec::{BoxError, BufferSource, BufferSpec, CustomLoader};

use crate::buffer::AudioBuffer;
use crate::context::AudioContext;
use crate::decoder::{extension_hint, Decoder};
use crate::key::SampleKey;
use crate::registry::BufferRegistry;
use crate::storage::Storage;

/// A sample that was left out of the registry.
#[derive(Clone, Debug)]
pub struct SkippedSample {
    pub key: SampleKey,
    pub id: String,
    pub reason: Arc<SkipReason>,
}

/// The outcome of a successful load.
#[derive(Clone, Debug, Default)]
pub struct LoadSummary {
    loaded: Vec<SampleKey>,
    skipped: Vec<SkippedSample>,
}

impl LoadSummary {
    /// Keys present in the registry when the load finished, sorted.
    pub fn loaded(&self) -> &[SampleKey] {
        &self.loaded
    }

    /// Samples that failed to load, sorted by key.
    pub fn skipped(&self) -> &[SkippedSample] {
        &self.skipped
    }

    fn from_registry(registry: &BufferRegistry) -> LoadSummary {
        LoadSummary {
            loaded: registry.keys(),
            skipped: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
enum LoadState {
    Loading,
    Loaded(LoadSummary),
    Failed(LoadError),
}

/// Tracks a load that is running in the background. The load settles exactly once and
/// every waiter observes the same result.
#[derive(Debug)]
pub(crate) struct LoadHandle {
    state: watch::Receiver<LoadState>,
}

impl LoadHandle {
    /// Starts loading on the current tokio runtime. Without a runtime the load settles
    /// immediately as failed.
    pub(crate) fn spawn(
        buffers: BufferSpec,
        context: AudioContext,
        registry: BufferRegistry,
        storage: Arc<dyn Storage>,
        decoder: Arc<dyn Decoder>,
    ) -> LoadHandle {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(err = %e, "Unable to load samples");
                let (_, state) = watch::channel(LoadState::Failed(LoadError::NoRuntime));
                return LoadHandle { state };
            }
        };

        let (tx, state) = watch::channel(LoadState::Loading);
        runtime.spawn(async move {
            let result = match load(buffers, context, registry, storage, decoder).await {
                Ok(summary) => LoadState::Loaded(summary),
                Err(e) => LoadState::Failed(e),
            };
            tx.send_replace(result);
        });

        LoadHandle { state }
    }

    /// Waits for the load to settle.
    pub(crate) async fn wait(&self) -> Result<LoadSummary, LoadError> {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(|state| !matches!(state, LoadState::Loading))
            .await;

        match settled.as_deref() {
            Ok(LoadState::Loaded(summary)) => Ok(summary.clone()),
            Ok(LoadState::Failed(e)) => Err(e.clone()),
            Ok(LoadState::Loading) | Err(_) => Err(LoadError::Aborted),
        }
    }

    /// Returns the summary if the load has finished successfully.
    pub(crate) fn summary(&self) -> Option<LoadSummary> {
        match &*self.state.borrow() {
            LoadState::Loaded(summary) => Some(summary.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        !matches!(&*self.state.borrow(), LoadState::Loading)
    }
}

async fn load(
    buffers: BufferSpec,
    context: AudioContext,
    registry: BufferRegistry,
    storage: Arc<dyn Storage>,
    decoder: Arc<dyn Decoder>,
) -> Result<LoadSummary, LoadError> {
    match buffers {
        BufferSpec::Sources(sources) => {
            Ok(load_sources(sources, context, registry, storage, decoder).await)
        }
        BufferSpec::Loader(loader) => {
            info!("Running custom sample loader");
            loader(context, registry.clone()).await.map_err(|e| {
                warn!(err = %e, "Custom sample loader failed");
                LoadError::Loader(Arc::from(e))
            })?;

            let summary = LoadSummary::from_registry(&registry);
            info!(
                loaded = summary.loaded.len(),
                memory_kb = registry.memory_size() / 1024,
                "Custom sample loader finished"
            );
            Ok(summary)
        }
    }
}

/// Loads every source concurrently. Sources that fail are skipped and never fail the
/// load as a whole.
async fn load_sources(
    sources: HashMap<SampleKey, BufferSource>,
    context: AudioContext,
    registry: BufferRegistry,
    storage: Arc<dyn Storage>,
    decoder: Arc<dyn Decoder>,
) -> LoadSummary {
    info!(samples = sources.len(), "Loading samples");

    let mut summary = LoadSummary::default();
    let mut tasks = JoinSet::new();
    let mut pending: HashMap<task::Id, (SampleKey, String)> = HashMap::new();
    for (key, source) in sources {
        match source {
            BufferSource::Buffers(buffers) => {
                debug!(key = %key, "Using preloaded buffers");
                registry.insert(key.clone(), buffers);
                summary.loaded.push(key);
            }
            BufferSource::Identifier(id) => {
                let context = context.clone();
                let storage = storage.clone();
                let decoder = decoder.clone();
                let sample_id = id.clone();
                let handle = tasks.spawn(async move {
                    fetch_and_decode(&sample_id, &context, storage, decoder).await
                });
                pending.insert(handle.id(), (key, id));
            }
        }
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        let (task_id, result) = match joined {
            Ok((task_id, result)) => (task_id, result),
            Err(e) => (e.id(), Err(SkipReason::Aborted(e.to_string()))),
        };
        let Some((key, id)) = pending.remove(&task_id) else {
            warn!(task = %task_id, "Finished load task has no sample");
            continue;
        };

        match result {
            Ok(buffer) => {
                debug!(key = %key, id = %id, frames = buffer.frames(), "Loaded sample");
                registry.insert(key.clone(), buffer);
                summary.loaded.push(key);
            }
            Err(reason) => {
                warn!(key = %key, id = %id, err = %reason, "Skipping sample");
                summary.skipped.push(SkippedSample {
                    key,
                    id,
                    reason: Arc::new(reason),
                });
            }
        }
    }

    summary.loaded.sort();
    summary.skipped.sort_by(|a, b| a.key.cmp(&b.key));
    info!(
        loaded = summary.loaded.len(),
        skipped = summary.skipped.len(),
        memory_kb = registry.memory_size() / 1024,
        "Samples loaded"
    );
    summary
}

async fn fetch_and_decode(
    id: &str,
    context: &AudioContext,
    storage: Arc<dyn Storage>,
    decoder: Arc<dyn Decoder>,
) -> Result<AudioBuffer, SkipReason> {
    let bytes = storage.fetch(id).await?.ok_or(SkipReason::NoData)?;
    let hint = extension_hint(id).map(str::to_string);
    let context = context.clone();

    // Decoding is CPU bound.
    let buffer = tokio::task::spawn_blocking(move || {
        decoder.decode(&context, bytes, hint.as_deref())
    })
    .await
    .map_err(|e| SkipReason::Aborted(e.to_string()))??;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fmt;

    use super::*;
    use crate::buffer::AudioBuffers;
    use crate::decoder::SymphoniaDecoder;
    use crate::storage::{FileStorage, MemoryStorage, StorageError};
    use crate::testutil::{constant_buffer, wav_bytes};

    fn spawn<S: Storage + 'static>(
        buffers: BufferSpec,
        storage: S,
    ) -> (LoadHandle, BufferRegistry) {
        let registry = BufferRegistry::new();
        let handle = LoadHandle::spawn(
            buffers,
            AudioContext::new(44100, 2),
            registry.clone(),
            Arc::new(storage),
            Arc::new(SymphoniaDecoder),
        );
        (handle, registry)
    }

    fn kick() -> Vec<u8> {
        wav_bytes(&[vec![0.5; 441]], 44100)
    }

    #[tokio::test]
    async fn test_failed_sources_are_skipped() {
        let storage: MemoryStorage = [("kick.wav", kick())].into_iter().collect();
        let buffers: BufferSpec = [(60, "kick.wav"), (62, "bad-url")].into();

        let (handle, registry) = spawn(buffers, storage);
        let summary = handle.wait().await.unwrap();

        assert_eq!(registry.keys(), vec![SampleKey::from(60)]);
        assert_eq!(summary.loaded(), &[SampleKey::from(60)]);
        assert_eq!(summary.skipped().len(), 1);
        assert_eq!(summary.skipped()[0].key, SampleKey::from(62));
        assert_eq!(summary.skipped()[0].id, "bad-url");
        assert!(matches!(*summary.skipped()[0].reason, SkipReason::NoData));
    }

    #[tokio::test]
    async fn test_undecodable_sources_are_skipped() {
        let storage: MemoryStorage = [
            ("kick.wav", kick()),
            ("broken.wav", b"not audio".to_vec()),
        ]
        .into_iter()
        .collect();
        let buffers: BufferSpec = [("kick", "kick.wav"), ("broken", "broken.wav")].into();

        let (handle, registry) = spawn(buffers, storage);
        let summary = handle.wait().await.unwrap();

        assert_eq!(registry.keys(), vec![SampleKey::from("kick")]);
        assert!(matches!(
            *summary.skipped()[0].reason,
            SkipReason::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_errors_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kick.wav"), kick()).unwrap();
        let buffers: BufferSpec = [
            (60, "kick.wav"),
            (62, "https://example.com/snare.wav"),
        ]
        .into();

        let (handle, registry) = spawn(buffers, FileStorage::new(dir.path()));
        let summary = handle.wait().await.unwrap();

        assert_eq!(registry.keys(), vec![SampleKey::from(60)]);
        assert_eq!(summary.skipped().len(), 1);
        assert_eq!(summary.skipped()[0].key, SampleKey::from(62));
        assert!(matches!(
            *summary.skipped()[0].reason,
            SkipReason::Fetch(StorageError::UnsupportedScheme(_))
        ));
    }

    /// Panics when asked for anything other than the kick.
    struct PanickingStorage(MemoryStorage);

    #[async_trait::async_trait]
    impl Storage for PanickingStorage {
        async fn fetch(&self, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
            if id != "kick.wav" {
                panic!("storage exploded fetching {}", id);
            }
            self.0.fetch(id).await
        }
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_skipped() {
        let storage = PanickingStorage([("kick.wav", kick())].into_iter().collect());
        let buffers: BufferSpec = [(60, "kick.wav"), (62, "snare.wav")].into();

        let (handle, registry) = spawn(buffers, storage);
        let summary = handle.wait().await.unwrap();

        assert_eq!(registry.keys(), vec![SampleKey::from(60)]);
        assert_eq!(summary.loaded(), &[SampleKey::from(60)]);
        assert_eq!(summary.skipped().len(), 1);
        assert_eq!(summary.skipped()[0].key, SampleKey::from(62));
        assert_eq!(summary.skipped()[0].id, "snare.wav");
        assert!(matches!(
            *summary.skipped()[0].reason,
            SkipReason::Aborted(_)
        ));
    }

    #[tokio::test]
    async fn test_preloaded_buffers_keep_identity() {
        let buffer = constant_buffer(0.25, 100, 44100);
        let buffers: BufferSpec = [("A", buffer.clone())].into();

        let (handle, registry) = spawn(buffers, MemoryStorage::new());
        handle.wait().await.unwrap();

        let stored = registry.buffer(&SampleKey::from("A"), 0).unwrap();
        assert!(AudioBuffer::ptr_eq(&stored, &buffer));
    }

    #[tokio::test]
    async fn test_preloaded_groups() {
        let group: AudioBuffers = [
            ("a", constant_buffer(0.1, 10, 44100)),
            ("b", constant_buffer(0.2, 10, 44100)),
        ]
        .into_iter()
        .collect();
        let buffers: BufferSpec = [("hat", group)].into();

        let (handle, registry) = spawn(buffers, MemoryStorage::new());
        handle.wait().await.unwrap();

        assert_eq!(registry.get(&SampleKey::from("hat")).map(|b| b.len()), Some(2));
    }

    #[tokio::test]
    async fn test_wait_is_repeatable() {
        let storage: MemoryStorage = [("kick.wav", kick())].into_iter().collect();
        let (handle, _) = spawn([(60, "kick.wav")].into(), storage);

        let first = handle.wait().await.unwrap();
        let second = handle.wait().await.unwrap();
        assert_eq!(first.loaded(), second.loaded());
        assert!(handle.is_settled());
        assert!(handle.summary().is_some());
    }

    #[tokio::test]
    async fn test_empty_sources() {
        let (handle, registry) = spawn(BufferSpec::default(), MemoryStorage::new());
        let summary = handle.wait().await.unwrap();
        assert!(summary.loaded().is_empty());
        assert!(registry.is_empty());
    }

    #[derive(Debug)]
    struct LoaderFailed;

    impl fmt::Display for LoaderFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "loader failed")
        }
    }

    impl Error for LoaderFailed {}

    #[tokio::test]
    async fn test_custom_loader_populates_registry() {
        let buffers = BufferSpec::loader(|context: AudioContext, registry: BufferRegistry| async move {
            registry.insert("custom", constant_buffer(0.5, 10, context.sample_rate()));
            Ok::<(), LoaderFailed>(())
        });

        let (handle, registry) = spawn(buffers, MemoryStorage::new());
        let summary = handle.wait().await.unwrap();

        assert_eq!(summary.loaded(), &[SampleKey::from("custom")]);
        assert!(registry.contains(&SampleKey::from("custom")));
    }

    #[tokio::test]
    async fn test_custom_loader_error_is_shared() {
        let buffers = BufferSpec::loader(|_, _| async { Err::<(), _>(LoaderFailed) });

        let (handle, _) = spawn(buffers, MemoryStorage::new());
        let first = handle.wait().await.unwrap_err();
        let second = handle.wait().await.unwrap_err();

        match (first, second) {
            (LoadError::Loader(first), LoadError::Loader(second)) => {
                assert!(Arc::ptr_eq(&first, &second));
                assert!(first.downcast_ref::<LoaderFailed>().is_some());
                assert_eq!(first.to_string(), "loader failed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(handle.summary().is_none());
    }

    #[test]
    fn test_no_runtime() {
        let (handle, _) = spawn(BufferSpec::default(), MemoryStorage::new());
        assert!(handle.is_settled());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert!(matches!(
            runtime.block_on(handle.wait()),
            Err(LoadError::NoRuntime)
        ));
    }
}
