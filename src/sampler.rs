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
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{SamplerConfig, SamplerOptions};
use crate::context::{AudioContext, AudioNode};
use crate::loader::{LoadError, LoadHandle, LoadSummary};
use crate::player::{PlaybackEngine, SamplePlayer, SampleStart, StopRequest, VoiceId};
use crate::registry::BufferRegistry;

/// A sample-based instrument.
///
/// Creating a sampler starts loading its samples in the background. Notes can be started
/// at any time, but only samples that have finished loading make a sound; await
/// [Sampler::loaded] first to be sure every sample is available.
pub struct Sampler<E: PlaybackEngine = SamplePlayer> {
    context: AudioContext,
    config: Arc<SamplerConfig>,
    engine: E,
    load: LoadHandle,
}

impl Sampler<SamplePlayer> {
    /// Creates a sampler that plays through the built-in [SamplePlayer].
    pub fn new(context: AudioContext, options: SamplerOptions) -> Self {
        Self::with_engine(context, options, SamplePlayer::new)
    }
}

impl<E: PlaybackEngine> Sampler<E> {
    /// Creates a sampler with a custom engine. The engine is handed the registry the
    /// samples are loaded into.
    pub fn with_engine<F>(context: AudioContext, options: SamplerOptions, engine: F) -> Self
    where
        F: FnOnce(AudioContext, Arc<SamplerConfig>, BufferRegistry) -> E,
    {
        let resolved = options.resolve(&context);
        let config = Arc::new(resolved.config);
        let engine = engine(context.clone(), config.clone(), BufferRegistry::new());
        debug!(
            sources = ?resolved.buffers.source_count(),
            output = engine.output().id(),
            "Sampler created"
        );

        let load = LoadHandle::spawn(
            resolved.buffers,
            context.clone(),
            engine.buffers().clone(),
            resolved.storage,
            resolved.decoder,
        );

        Sampler {
            context,
            config,
            engine,
            load,
        }
    }

    /// Waits until loading has finished. Every call observes the same outcome.
    pub async fn loaded(&self) -> Result<&Self, LoadError> {
        self.load.wait().await?;
        Ok(self)
    }

    /// What was loaded and skipped, once loading has succeeded.
    pub fn load_summary(&self) -> Option<LoadSummary> {
        self.load.summary()
    }

    /// Whether loading has finished, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.load.is_settled()
    }

    /// Starts a note. Accepts a bare key or a full [SampleStart].
    pub fn start<S: Into<SampleStart>>(&self, request: S) -> Option<VoiceId> {
        self.engine.start(request.into())
    }

    /// Stops notes. Accepts a stop id, a [crate::SampleStop], or `()` for every note.
    pub fn stop<S: Into<StopRequest>>(&self, request: S) {
        self.engine.stop(request.into().into_stop());
    }

    /// Releases every playing note, whatever its stop id.
    pub fn stop_all(&self) {
        self.engine.stop(None);
    }

    /// The instrument's output node.
    pub fn output(&self) -> &AudioNode {
        self.engine.output()
    }

    /// Silences the instrument and removes its output from the destination. Calling it
    /// again is harmless, and notes can still be started afterwards.
    pub fn disconnect(&self) {
        self.engine.disconnect();
    }

    /// The context the instrument plays into.
    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// The registry the engine plays from. Samples appear here as they load.
    pub fn buffers(&self) -> &BufferRegistry {
        self.engine.buffers()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: PlaybackEngine> fmt::Debug for Sampler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("config", &self.config)
            .field("buffers", self.engine.buffers())
            .field("loaded", &self.load.is_settled())
            .finish()
    }
}
