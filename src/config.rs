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

//! Sampler configuration: user options, their defaults, and instrument definition files.

mod error;
mod instrument;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

pub use error::ConfigError;
pub use instrument::InstrumentDefinition;

use crate::context::{AudioContext, AudioNode};
use crate::decoder::{Decoder, SymphoniaDecoder};
use crate::loader::BufferSpec;
use crate::storage::{DefaultStorage, Storage};
use crate::velocity::midi_vel_to_gain;

/// Default detune in cents.
pub const DEFAULT_DETUNE: f32 = 0.0;

/// Default instrument volume.
pub const DEFAULT_VOLUME: f32 = 100.0;

/// Default velocity for notes started without one.
pub const DEFAULT_VELOCITY: f32 = 100.0;

/// Maps a volume or velocity to a linear gain.
pub type GainCurve = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

/// Partial sampler configuration. Every field is optional; unset fields take their
/// defaults when the sampler is created.
#[derive(Clone, Default)]
pub struct SamplerOptions {
    pub storage: Option<Arc<dyn Storage>>,
    pub decoder: Option<Arc<dyn Decoder>>,
    pub detune: Option<f32>,
    pub volume: Option<f32>,
    pub velocity: Option<f32>,
    pub decay_time: Option<f64>,
    pub lpf_cutoff_hz: Option<f32>,
    pub destination: Option<AudioNode>,
    pub buffers: Option<BufferSpec>,
    pub volume_to_gain: Option<GainCurve>,
}

impl SamplerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage<S: Storage + 'static>(mut self, storage: S) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    pub fn with_decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune = Some(cents);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_decay_time(mut self, seconds: f64) -> Self {
        self.decay_time = Some(seconds);
        self
    }

    pub fn with_lpf_cutoff_hz(mut self, hz: f32) -> Self {
        self.lpf_cutoff_hz = Some(hz);
        self
    }

    pub fn with_destination(mut self, destination: AudioNode) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_buffers<B: Into<BufferSpec>>(mut self, buffers: B) -> Self {
        self.buffers = Some(buffers.into());
        self
    }

    pub fn with_volume_to_gain<F>(mut self, curve: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        self.volume_to_gain = Some(Arc::new(curve));
        self
    }

    /// Fills in every unset field with its default. This cannot fail: malformed buffer
    /// sources only surface once they are loaded.
    pub fn resolve(self, context: &AudioContext) -> ResolvedOptions {
        let config = SamplerConfig {
            detune: self.detune.unwrap_or(DEFAULT_DETUNE),
            volume: self.volume.unwrap_or(DEFAULT_VOLUME),
            velocity: self.velocity.unwrap_or(DEFAULT_VELOCITY),
            decay_time: self.decay_time,
            lpf_cutoff_hz: self.lpf_cutoff_hz,
            destination: self
                .destination
                .unwrap_or_else(|| context.destination().clone()),
            volume_to_gain: self
                .volume_to_gain
                .unwrap_or_else(|| Arc::new(midi_vel_to_gain)),
        };
        debug!(config = ?config, "Resolved sampler configuration");

        ResolvedOptions {
            config,
            buffers: self.buffers.unwrap_or_default(),
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(DefaultStorage::default())),
            decoder: self.decoder.unwrap_or_else(|| Arc::new(SymphoniaDecoder)),
        }
    }
}

impl fmt::Debug for SamplerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerOptions")
            .field("detune", &self.detune)
            .field("volume", &self.volume)
            .field("velocity", &self.velocity)
            .field("decay_time", &self.decay_time)
            .field("lpf_cutoff_hz", &self.lpf_cutoff_hz)
            .field("destination", &self.destination)
            .field("buffers", &self.buffers)
            .field("custom_storage", &self.storage.is_some())
            .field("custom_decoder", &self.decoder.is_some())
            .field("custom_volume_to_gain", &self.volume_to_gain.is_some())
            .finish()
    }
}

/// The result of resolving options: the frozen configuration plus the inputs of the
/// load pipeline, which are consumed when the sampler starts loading.
pub struct ResolvedOptions {
    pub config: SamplerConfig,
    pub buffers: BufferSpec,
    pub storage: Arc<dyn Storage>,
    pub decoder: Arc<dyn Decoder>,
}

/// Fully resolved sampler configuration. Immutable once created.
#[derive(Clone)]
pub struct SamplerConfig {
    detune: f32,
    volume: f32,
    velocity: f32,
    decay_time: Option<f64>,
    lpf_cutoff_hz: Option<f32>,
    destination: AudioNode,
    volume_to_gain: GainCurve,
}

impl SamplerConfig {
    /// Detune in cents.
    pub fn detune(&self) -> f32 {
        self.detune
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Velocity used for notes that are started without one.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Release time in seconds, if configured.
    pub fn decay_time(&self) -> Option<f64> {
        self.decay_time
    }

    pub fn lpf_cutoff_hz(&self) -> Option<f32> {
        self.lpf_cutoff_hz
    }

    /// The node the instrument's output is connected to.
    pub fn destination(&self) -> &AudioNode {
        &self.destination
    }

    /// Converts a volume or velocity to gain using the configured curve.
    pub fn volume_to_gain(&self, volume: f32) -> f32 {
        (self.volume_to_gain)(volume)
    }
}

impl fmt::Debug for SamplerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerConfig")
            .field("detune", &self.detune)
            .field("volume", &self.volume)
            .field("velocity", &self.velocity)
            .field("decay_time", &self.decay_time)
            .field("lpf_cutoff_hz", &self.lpf_cutoff_hz)
            .field("destination", &self.destination.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::BufferSource;

    #[test]
    fn test_defaults() {
        let context = AudioContext::new(44100, 2);
        let resolved = SamplerOptions::new().resolve(&context);
        let config = &resolved.config;

        assert_eq!(config.detune(), 0.0);
        assert_eq!(config.volume(), 100.0);
        assert_eq!(config.velocity(), 100.0);
        assert_eq!(config.decay_time(), None);
        assert_eq!(config.lpf_cutoff_hz(), None);
        assert_eq!(config.destination(), context.destination());
        assert_eq!(config.volume_to_gain(127.0), 1.0);
        assert!((config.volume_to_gain(100.0) - 0.787).abs() < 1e-3);
        assert!(matches!(resolved.buffers, BufferSpec::Sources(ref s) if s.is_empty()));
    }

    #[test]
    fn test_overrides() {
        let context = AudioContext::new(44100, 2);
        let destination = AudioNode::new();
        let resolved = SamplerOptions::new()
            .with_detune(-50.0)
            .with_volume(64.0)
            .with_velocity(90.0)
            .with_decay_time(0.5)
            .with_lpf_cutoff_hz(2000.0)
            .with_destination(destination.clone())
            .with_volume_to_gain(|v| v / 100.0)
            .with_buffers([("kick", BufferSource::from("kick.wav"))])
            .resolve(&context);
        let config = &resolved.config;

        assert_eq!(config.detune(), -50.0);
        assert_eq!(config.volume(), 64.0);
        assert_eq!(config.velocity(), 90.0);
        assert_eq!(config.decay_time(), Some(0.5));
        assert_eq!(config.lpf_cutoff_hz(), Some(2000.0));
        assert_eq!(config.destination(), &destination);
        assert_ne!(config.destination(), context.destination());
        assert_eq!(config.volume_to_gain(50.0), 0.5);
        assert!(matches!(resolved.buffers, BufferSpec::Sources(ref s) if s.len() == 1));
    }
}
