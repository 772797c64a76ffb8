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

//! Decoded, in-memory audio buffers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decoded sample data.
struct BufferData {
    /// Planar samples, one Vec per channel. All channels have the same length.
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

/// A decoded audio sample, ready to play.
///
/// The data is stored in an Arc so a buffer can be shared between the registry and any
/// number of voices. Clones refer to the same data; use [`AudioBuffer::ptr_eq`] to check
/// whether two handles are the same buffer.
#[derive(Clone)]
pub struct AudioBuffer {
    data: Arc<BufferData>,
}

impl AudioBuffer {
    /// Creates a buffer from planar channel data. Channels longer than the shortest one
    /// are truncated so that every channel has the same number of frames.
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for channel in channels.iter_mut() {
            channel.truncate(frames);
        }
        Self {
            data: Arc::new(BufferData {
                channels,
                sample_rate,
            }),
        }
    }

    /// Creates a buffer from interleaved samples. Trailing samples that do not make up a
    /// full frame are dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: u16, sample_rate: u32) -> Self {
        let num_channels = channel_count as usize;
        if num_channels == 0 {
            return Self::new(Vec::new(), sample_rate);
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (ch, sample) in frame.iter().enumerate() {
                channels[ch].push(*sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Returns true if both handles refer to the same buffer.
    pub fn ptr_eq(a: &AudioBuffer, b: &AudioBuffer) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }

    pub fn sample_rate(&self) -> u32 {
        self.data.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.data.channels.len() as u16
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Returns the samples of the given channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.data.channels.get(index).map(|c| c.as_slice())
    }

    pub fn duration(&self) -> Duration {
        if self.data.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.data.sample_rate as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.channels.iter().map(|c| c.len()).sum::<usize>() * std::mem::size_of::<f32>()
    }

    /// Returns a copy of this buffer converted to the target sample rate using linear
    /// interpolation. Good enough for one-shots and drum hits. Returns a clone of this
    /// buffer when the rate already matches.
    pub fn resampled(&self, target_rate: u32) -> AudioBuffer {
        let source_rate = self.data.sample_rate;
        if source_rate == target_rate || source_rate == 0 || target_rate == 0 {
            return self.clone();
        }

        let ratio = target_rate as f64 / source_rate as f64;
        let source_frames = self.frames() as u64;
        let target_frames = (source_frames * target_rate as u64).div_ceil(source_rate as u64) as usize;

        let channels = self
            .data
            .channels
            .iter()
            .map(|samples| {
                let mut output = Vec::with_capacity(target_frames);
                for target_frame in 0..target_frames {
                    let source_pos = target_frame as f64 / ratio;
                    let source_frame = source_pos.floor() as usize;
                    let frac = source_pos.fract() as f32;

                    let s0 = samples.get(source_frame).copied().unwrap_or(0.0);
                    let s1 = samples.get(source_frame + 1).copied().unwrap_or(s0);
                    output.push(s0 + (s1 - s0) * frac);
                }
                output
            })
            .collect();

        AudioBuffer::new(channels, target_rate)
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("channels", &self.channel_count())
            .field("frames", &self.frames())
            .field("sample_rate", &self.sample_rate())
            .finish()
    }
}

/// A registry entry: a single buffer, or a named group of buffers that are played in turn.
#[derive(Clone, Debug)]
pub enum AudioBuffers {
    Single(AudioBuffer),
    Group(BTreeMap<String, AudioBuffer>),
}

impl AudioBuffers {
    /// Returns the buffer at the given position. A single buffer is returned for every
    /// index; groups wrap around in name order.
    pub fn get(&self, index: usize) -> Option<&AudioBuffer> {
        match self {
            AudioBuffers::Single(buffer) => Some(buffer),
            AudioBuffers::Group(group) if group.is_empty() => None,
            AudioBuffers::Group(group) => group.values().nth(index % group.len()),
        }
    }

    /// Returns the number of buffers in this entry.
    pub fn len(&self) -> usize {
        match self {
            AudioBuffers::Single(_) => 1,
            AudioBuffers::Group(group) => group.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the single buffer, if this entry is not a group.
    pub fn as_single(&self) -> Option<&AudioBuffer> {
        match self {
            AudioBuffers::Single(buffer) => Some(buffer),
            AudioBuffers::Group(_) => None,
        }
    }
}

impl From<AudioBuffer> for AudioBuffers {
    fn from(buffer: AudioBuffer) -> Self {
        AudioBuffers::Single(buffer)
    }
}

impl<S: Into<String>> FromIterator<(S, AudioBuffer)> for AudioBuffers {
    fn from_iter<T: IntoIterator<Item = (S, AudioBuffer)>>(iter: T) -> Self {
        AudioBuffers::Group(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
