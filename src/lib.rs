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

//! A sample-based instrument.
//!
//! A [`Sampler`] maps note keys to audio samples, loads them in the background and
//! plays them through a [`PlaybackEngine`] whose output feeds an [`AudioNode`] in an
//! [`AudioContext`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use smplr::{AudioContext, BufferSpec, Sampler, SamplerOptions};
//!
//! let context = AudioContext::new(44100, 2);
//! let buffers: BufferSpec = [(60, "kick.wav"), (62, "snare.wav")].into_iter().collect();
//! let sampler = Sampler::new(context, SamplerOptions::new().with_buffers(buffers));
//!
//! sampler.loaded().await?;
//! sampler.start(60);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod context;
pub mod decoder;
pub mod key;
pub mod loader;
pub mod player;
pub mod registry;
pub mod sampler;
pub mod storage;
pub mod velocity;

#[cfg(test)]
mod testutil;

pub use buffer::{AudioBuffer, AudioBuffers};
pub use config::{GainCurve, InstrumentDefinition, SamplerConfig, SamplerOptions};
pub use context::{AudioContext, AudioNode, NodeSource};
pub use decoder::{DecodeError, Decoder, SymphoniaDecoder};
pub use key::SampleKey;
pub use loader::{BufferSource, BufferSpec, LoadError, LoadSummary, SkipReason, SkippedSample};
pub use player::{
    PlaybackEngine, SamplePlayer, SampleStart, SampleStop, StopRequest, VoiceId,
};
pub use registry::BufferRegistry;
pub use sampler::Sampler;
pub use storage::{
    CachedStorage, DefaultStorage, FileStorage, HttpStorage, MemoryStorage, Storage, StorageError,
};
pub use velocity::{db_to_gain, gain_to_db, midi_vel_to_gain};
