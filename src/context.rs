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

//! The audio context: a sample clock plus a small pull-based mixing graph.
//!
//! Every node sums its sources and the nodes connected to it, applies its gain and adds
//! the result to whatever is pulling from it. Rendering the context pulls a block from the
//! destination node and advances the clock. The graph is expected to be acyclic.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Global node ID counter.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Something that produces audio into a node.
pub trait NodeSource: Send + Sync {
    /// Adds one block of planar audio into `output`. The block starts at the absolute
    /// context frame `position` and is `output[0].len()` frames long.
    fn mix(&self, output: &mut [Vec<f32>], position: u64);
}

struct NodeInner {
    id: u64,
    gain: Mutex<f32>,
    sources: Mutex<Vec<Arc<dyn NodeSource>>>,
    inputs: Mutex<Vec<Arc<NodeInner>>>,
}

impl NodeSource for NodeInner {
    fn mix(&self, output: &mut [Vec<f32>], position: u64) {
        // Snapshot so no lock is held while children render.
        let sources = self.sources.lock().clone();
        let inputs = self.inputs.lock().clone();
        if sources.is_empty() && inputs.is_empty() {
            return;
        }

        let frames = output.first().map(|c| c.len()).unwrap_or(0);
        let mut block = vec![vec![0.0f32; frames]; output.len()];
        for source in sources.iter() {
            source.mix(&mut block, position);
        }
        for input in inputs.iter() {
            input.mix(&mut block, position);
        }

        let gain = *self.gain.lock();
        for (out, mixed) in output.iter_mut().zip(block.iter()) {
            for (o, m) in out.iter_mut().zip(mixed.iter()) {
                *o += m * gain;
            }
        }
    }
}

/// A node in the audio graph. Clones refer to the same node.
#[derive(Clone)]
pub struct AudioNode {
    inner: Arc<NodeInner>,
}

impl AudioNode {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NEXT_NODE_ID.fetch_add(1, Ordering::SeqCst),
                gain: Mutex::new(1.0),
                sources: Mutex::new(Vec::new()),
                inputs: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn gain(&self) -> f32 {
        *self.inner.gain.lock()
    }

    pub fn set_gain(&self, gain: f32) {
        *self.inner.gain.lock() = gain;
    }

    /// Routes this node's output into `destination`. Connecting twice has no effect.
    pub fn connect(&self, destination: &AudioNode) {
        let mut inputs = destination.inner.inputs.lock();
        if !inputs.iter().any(|n| Arc::ptr_eq(n, &self.inner)) {
            inputs.push(self.inner.clone());
        }
    }

    /// Removes this node from `destination`'s inputs. Returns false if it was not connected.
    pub fn disconnect_from(&self, destination: &AudioNode) -> bool {
        let mut inputs = destination.inner.inputs.lock();
        let before = inputs.len();
        inputs.retain(|n| !Arc::ptr_eq(n, &self.inner));
        inputs.len() != before
    }

    pub fn is_connected_to(&self, destination: &AudioNode) -> bool {
        destination
            .inner
            .inputs
            .lock()
            .iter()
            .any(|n| Arc::ptr_eq(n, &self.inner))
    }

    /// Attaches a source that renders directly into this node.
    pub fn add_source(&self, source: Arc<dyn NodeSource>) {
        self.inner.sources.lock().push(source);
    }

    fn render(&self, output: &mut [Vec<f32>], position: u64) {
        self.inner.mix(output, position);
    }
}

impl Default for AudioNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AudioNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AudioNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioNode")
            .field("id", &self.id())
            .field("gain", &self.gain())
            .field("inputs", &self.inner.inputs.lock().len())
            .finish()
    }
}

struct ContextInner {
    sample_rate: u32,
    channels: u16,
    frame: AtomicU64,
    destination: AudioNode,
}

/// The playback clock and graph host shared by every instrument. Clones refer to the
/// same context.
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<ContextInner>,
}

impl AudioContext {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                sample_rate,
                channels,
                frame: AtomicU64::new(0),
                destination: AudioNode::new(),
            }),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    /// The main output of the context.
    pub fn destination(&self) -> &AudioNode {
        &self.inner.destination
    }

    /// The number of frames rendered so far.
    pub fn current_frame(&self) -> u64 {
        self.inner.frame.load(Ordering::SeqCst)
    }

    /// The current time in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_frame() as f64 / self.inner.sample_rate as f64
    }

    /// Converts a time in seconds to a frame position. Negative times map to frame 0.
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.inner.sample_rate as f64).round() as u64
    }

    /// Renders the next block of planar audio from the destination and advances the clock.
    pub fn render(&self, frames: usize) -> Vec<Vec<f32>> {
        let mut output = vec![vec![0.0f32; frames]; self.inner.channels as usize];
        let position = self.inner.frame.fetch_add(frames as u64, Ordering::SeqCst);
        self.inner.destination.render(&mut output, position);
        output
    }

    /// Renders the next block as interleaved samples.
    pub fn render_interleaved(&self, frames: usize) -> Vec<f32> {
        let planar = self.render(frames);
        let mut interleaved = Vec::with_capacity(frames * planar.len());
        for frame in 0..frames {
            for channel in planar.iter() {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.sample_rate())
            .field("channels", &self.channels())
            .field("frame", &self.current_frame())
            .finish()
    }
}
