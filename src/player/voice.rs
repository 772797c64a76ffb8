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

//! Voices: a buffer being played back, and the bus that mixes them.

use std::f32::consts::PI;

use parking_lot::Mutex;
use tracing::debug;

use super::request::VoiceId;
use crate::buffer::AudioBuffer;
use crate::context::NodeSource;
use crate::key::SampleKey;

/// A one-pole low-pass filter per output channel.
struct LowPass {
    alpha: f32,
    state: Vec<f32>,
}

impl LowPass {
    fn new(cutoff_hz: f32, sample_rate: u32, channels: usize) -> Self {
        let cutoff = cutoff_hz.clamp(0.0, sample_rate as f32 / 2.0);
        Self {
            alpha: 1.0 - (-2.0 * PI * cutoff / sample_rate as f32).exp(),
            state: vec![0.0; channels],
        }
    }

    fn process(&mut self, channel: usize, input: f32) -> f32 {
        if channel >= self.state.len() {
            self.state.resize(channel + 1, 0.0);
        }
        let y = &mut self.state[channel];
        *y += self.alpha * (input - *y);
        *y
    }
}

/// Everything needed to create a voice.
pub(crate) struct VoiceParams {
    pub buffer: AudioBuffer,
    pub stop_id: SampleKey,
    pub gain: f32,
    /// Source frames advanced per output frame.
    pub rate: f64,
    pub start_frame: u64,
    pub stop_frame: Option<u64>,
    pub release_frames: u64,
    pub lpf: Option<(f32, u32)>,
}

/// A single playing buffer.
pub(crate) struct Voice {
    id: VoiceId,
    buffer: AudioBuffer,
    stop_id: SampleKey,
    gain: f32,
    rate: f64,
    start_frame: u64,
    /// Frame at which the release begins.
    stop_frame: Option<u64>,
    release_frames: u64,
    lpf: Option<LowPass>,
    finished: bool,
}

impl Voice {
    pub(crate) fn new(params: VoiceParams) -> Self {
        let channels = params.buffer.channel_count() as usize;
        Self {
            id: VoiceId::next(),
            lpf: params
                .lpf
                .map(|(cutoff, sample_rate)| LowPass::new(cutoff, sample_rate, channels)),
            buffer: params.buffer,
            stop_id: params.stop_id,
            gain: params.gain,
            rate: params.rate,
            start_frame: params.start_frame,
            stop_frame: params.stop_frame,
            release_frames: params.release_frames,
            finished: false,
        }
    }

    pub(crate) fn id(&self) -> VoiceId {
        self.id
    }

    pub(crate) fn stop_id(&self) -> &SampleKey {
        &self.stop_id
    }

    /// Schedules the release. An earlier scheduled release is kept.
    pub(crate) fn release_at(&mut self, frame: u64) {
        self.stop_frame = Some(match self.stop_frame {
            Some(existing) => existing.min(frame),
            None => frame,
        });
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Envelope at an absolute frame, or None once the release has completed.
    fn envelope(&self, frame: u64) -> Option<f32> {
        match self.stop_frame {
            Some(stop) if frame >= stop => {
                let released = frame - stop;
                if released >= self.release_frames {
                    None
                } else {
                    Some(1.0 - released as f32 / self.release_frames as f32)
                }
            }
            _ => Some(1.0),
        }
    }

    /// Reads one interpolated sample, or None past the end of the buffer.
    fn read(&self, channel: &[f32], position: f64) -> Option<f32> {
        let index = position as usize;
        let current = *channel.get(index)?;
        let next = channel.get(index + 1).copied().unwrap_or(0.0);
        let frac = (position - index as f64) as f32;
        Some(current + (next - current) * frac)
    }

    /// Adds this voice into the block starting at `position`.
    pub(crate) fn mix(&mut self, output: &mut [Vec<f32>], position: u64) {
        let frames = output.first().map(|c| c.len()).unwrap_or(0);
        let buffer_channels = self.buffer.channel_count() as usize;
        if buffer_channels == 0 {
            self.finished = true;
            return;
        }

        for i in 0..frames {
            let frame = position + i as u64;
            if frame < self.start_frame {
                continue;
            }
            let envelope = match self.envelope(frame) {
                Some(envelope) => envelope,
                None => {
                    self.finished = true;
                    return;
                }
            };

            let source_position = (frame - self.start_frame) as f64 * self.rate;
            for (c, out) in output.iter_mut().enumerate() {
                // Mono feeds every channel.
                let source = match self.buffer.channel(c % buffer_channels) {
                    Some(source) => source,
                    None => continue,
                };
                let sample = match self.read(source, source_position) {
                    Some(sample) => sample,
                    None => {
                        self.finished = true;
                        return;
                    }
                };
                let sample = match self.lpf.as_mut() {
                    Some(lpf) => lpf.process(c, sample),
                    None => sample,
                };
                out[i] += sample * self.gain * envelope;
            }
        }
    }
}

/// The set of voices mixed into an instrument's output.
#[derive(Default)]
pub(crate) struct VoiceBus {
    voices: Mutex<Vec<Voice>>,
}

impl VoiceBus {
    pub(crate) fn add(&self, voice: Voice) -> VoiceId {
        let id = voice.id();
        self.voices.lock().push(voice);
        id
    }

    /// Releases the matching voices at `frame`. None matches every voice.
    pub(crate) fn release(&self, stop_id: Option<&SampleKey>, frame: u64) -> usize {
        let mut voices = self.voices.lock();
        let mut released = 0;
        for voice in voices.iter_mut() {
            if stop_id.map_or(true, |id| id == voice.stop_id()) {
                voice.release_at(frame);
                released += 1;
            }
        }
        released
    }

    pub(crate) fn clear(&self) -> usize {
        let mut voices = self.voices.lock();
        let count = voices.len();
        voices.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.voices.lock().len()
    }
}

impl NodeSource for VoiceBus {
    fn mix(&self, output: &mut [Vec<f32>], position: u64) {
        let mut voices = self.voices.lock();
        for voice in voices.iter_mut() {
            voice.mix(output, position);
        }
        voices.retain(|voice| {
            if voice.is_finished() {
                debug!(voice = %voice.id(), "Voice finished");
            }
            !voice.is_finished()
        });
    }
}
