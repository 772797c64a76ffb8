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
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::buffer::{AudioBuffer, AudioBuffers};
use crate::context::AudioContext;
use crate::key::SampleKey;
use crate::registry::BufferRegistry;

/// Errors returned by custom loaders.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A caller-supplied loader. It is called once with the context and a handle to the
/// instrument's registry, and populates the registry however it likes.
pub type CustomLoader =
    Arc<dyn Fn(AudioContext, BufferRegistry) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Where the sample for one key comes from.
#[derive(Clone, Debug)]
pub enum BufferSource {
    /// An identifier that is fetched from storage and decoded.
    Identifier(String),
    /// Already decoded audio, stored in the registry as-is.
    Buffers(AudioBuffers),
}

impl From<&str> for BufferSource {
    fn from(id: &str) -> Self {
        BufferSource::Identifier(id.to_string())
    }
}

impl From<String> for BufferSource {
    fn from(id: String) -> Self {
        BufferSource::Identifier(id)
    }
}

impl From<AudioBuffer> for BufferSource {
    fn from(buffer: AudioBuffer) -> Self {
        BufferSource::Buffers(AudioBuffers::Single(buffer))
    }
}

impl From<AudioBuffers> for BufferSource {
    fn from(buffers: AudioBuffers) -> Self {
        BufferSource::Buffers(buffers)
    }
}

/// How an instrument gets its samples.
#[derive(Clone)]
pub enum BufferSpec {
    /// A source per key, loaded concurrently by the default loader. Keys that fail to
    /// load are left out of the registry.
    Sources(HashMap<SampleKey, BufferSource>),
    /// A custom loader. Its errors fail the load.
    Loader(CustomLoader),
}

impl BufferSpec {
    /// Wraps an async function as a custom loader.
    pub fn loader<F, Fut, E>(loader: F) -> Self
    where
        F: Fn(AudioContext, BufferRegistry) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        BufferSpec::Loader(Arc::new(move |context, registry| {
            let load = loader(context, registry);
            async move { load.await.map_err(Into::into) }.boxed()
        }))
    }

    /// Returns the number of sources, or None for a custom loader.
    pub fn source_count(&self) -> Option<usize> {
        match self {
            BufferSpec::Sources(sources) => Some(sources.len()),
            BufferSpec::Loader(_) => None,
        }
    }
}

impl Default for BufferSpec {
    fn default() -> Self {
        BufferSpec::Sources(HashMap::new())
    }
}

impl fmt::Debug for BufferSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferSpec::Sources(sources) => f.debug_tuple("Sources").field(&sources.len()).finish(),
            BufferSpec::Loader(_) => f.write_str("Loader"),
        }
    }
}

impl From<HashMap<SampleKey, BufferSource>> for BufferSpec {
    fn from(sources: HashMap<SampleKey, BufferSource>) -> Self {
        BufferSpec::Sources(sources)
    }
}

impl<K, V> FromIterator<(K, V)> for BufferSpec
where
    K: Into<SampleKey>,
    V: Into<BufferSource>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        BufferSpec::Sources(
            iter.into_iter()
                .map(|(key, source)| (key.into(), source.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for BufferSpec
where
    K: Into<SampleKey>,
    V: Into<BufferSource>,
{
    fn from(sources: [(K, V); N]) -> Self {
        sources.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_normalize_keys() {
        let spec: BufferSpec = [("60", "kick.wav"), ("snare", "snare.wav")].into();
        match spec {
            BufferSpec::Sources(sources) => {
                assert!(matches!(
                    sources.get(&SampleKey::from(60)),
                    Some(BufferSource::Identifier(id)) if id == "kick.wav"
                ));
                assert!(sources.contains_key(&SampleKey::from("snare")));
            }
            BufferSpec::Loader(_) => panic!("expected sources"),
        }
    }

    #[test]
    fn test_source_count() {
        assert_eq!(BufferSpec::default().source_count(), Some(0));
        let loader = BufferSpec::loader(|_, _| async { Ok::<(), BoxError>(()) });
        assert_eq!(loader.source_count(), None);
        assert_eq!(format!("{:?}", loader), "Loader");
    }
}
