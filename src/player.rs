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

//! Playback engines. The sampler drives an engine through [PlaybackEngine]; the
//! engine reads the buffer registry every time a note starts.

mod request;
mod voice;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

pub use request::{SampleStart, SampleStop, StopRequest, VoiceId};

use crate::config::SamplerConfig;
use crate::context::{AudioContext, AudioNode};
use crate::key::SampleKey;
use crate::registry::BufferRegistry;
use voice::{Voice, VoiceBus, VoiceParams};

/// Release time used when neither the note nor the instrument sets one.
pub const DEFAULT_RELEASE_SECONDS: f64 = 0.2;

/// Plays samples from a buffer registry.
pub trait PlaybackEngine: Send + Sync {
    /// Starts a note. Returns None if there is nothing to play for the note.
    fn start(&self, request: SampleStart) -> Option<VoiceId>;

    /// Releases voices. None releases every voice.
    fn stop(&self, request: Option<SampleStop>);

    /// Silences the engine and removes its output from the destination. Calling this
    /// more than once is harmless.
    fn disconnect(&self);

    /// The node the engine renders into.
    fn output(&self) -> &AudioNode;

    /// The registry the engine plays from.
    fn buffers(&self) -> &BufferRegistry;
}

/// The built-in engine: polyphonic, sample accurate against the context clock.
pub struct SamplePlayer {
    context: AudioContext,
    config: Arc<SamplerConfig>,
    buffers: BufferRegistry,
    output: AudioNode,
    voices: Arc<VoiceBus>,
    /// Next group index per key.
    round_robin: Mutex<HashMap<SampleKey, usize>>,
}

impl SamplePlayer {
    /// Creates a player and connects its output to the configured destination.
    pub fn new(
        context: AudioContext,
        config: Arc<SamplerConfig>,
        buffers: BufferRegistry,
    ) -> SamplePlayer {
        let output = AudioNode::new();
        output.set_gain(config.volume_to_gain(config.volume()));
        output.connect(config.destination());

        let voices = Arc::new(VoiceBus::default());
        output.add_source(voices.clone());

        SamplePlayer {
            context,
            config,
            buffers,
            output,
            voices,
            round_robin: Mutex::new(HashMap::new()),
        }
    }

    /// The number of voices that are still playing or waiting to play.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn next_index(&self, key: &SampleKey) -> usize {
        let mut round_robin = self.round_robin.lock();
        let counter = round_robin.entry(key.clone()).or_insert(0);
        let index = *counter;
        *counter = counter.wrapping_add(1);
        index
    }

    /// Converts an optional time to a frame, never earlier than now.
    fn frame_at_or_now(&self, time: Option<f64>) -> u64 {
        let now = self.context.current_frame();
        match time {
            Some(time) => self.context.frame_at(time).max(now),
            None => now,
        }
    }
}

impl PlaybackEngine for SamplePlayer {
    fn start(&self, request: SampleStart) -> Option<VoiceId> {
        let buffers = match self.buffers.get(&request.note) {
            Some(buffers) => buffers,
            None => {
                debug!(note = %request.note, "No sample for note");
                return None;
            }
        };
        let index = if buffers.len() > 1 {
            self.next_index(&request.note)
        } else {
            0
        };
        let buffer = buffers.get(index)?.clone();

        let velocity = request.velocity.unwrap_or(self.config.velocity());
        let detune = request.detune.unwrap_or(self.config.detune());
        let rate = 2f64.powf(detune as f64 / 1200.0) * buffer.sample_rate() as f64
            / self.context.sample_rate() as f64;
        let start_frame = self.frame_at_or_now(request.time);
        let stop_frame = request
            .duration
            .map(|duration| start_frame.saturating_add(self.context.frame_at(duration)));
        let release = request
            .decay_time
            .or(self.config.decay_time())
            .unwrap_or(DEFAULT_RELEASE_SECONDS);
        let lpf = request
            .lpf_cutoff_hz
            .or(self.config.lpf_cutoff_hz())
            .map(|cutoff| (cutoff, self.context.sample_rate()));

        let id = self.voices.add(Voice::new(VoiceParams {
            stop_id: request.effective_stop_id().clone(),
            gain: self.config.volume_to_gain(velocity),
            rate,
            start_frame,
            stop_frame,
            release_frames: self.context.frame_at(release),
            lpf,
            buffer,
        }));
        debug!(
            note = %request.note,
            voice = %id,
            velocity,
            detune,
            start_frame,
            "Started voice"
        );
        Some(id)
    }

    fn stop(&self, request: Option<SampleStop>) {
        let (stop_id, time) = match request {
            Some(stop) => (stop.stop_id, stop.time),
            None => (None, None),
        };
        let frame = self.frame_at_or_now(time);
        let released = self.voices.release(stop_id.as_ref(), frame);
        debug!(
            stop_id = ?stop_id,
            frame,
            released,
            "Released voices"
        );
    }

    fn disconnect(&self) {
        let dropped = self.voices.clear();
        if self.output.disconnect_from(self.config.destination()) {
            info!(dropped, "Sampler disconnected");
        }
    }

    fn output(&self) -> &AudioNode {
        &self.output
    }

    fn buffers(&self) -> &BufferRegistry {
        &self.buffers
    }
}

impl fmt::Debug for SamplePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplePlayer")
            .field("output", &self.output.id())
            .field("buffers", &self.buffers)
            .field("active_voices", &self.voices.len())
            .finish()
    }
}
