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
use std::sync::atomic::{AtomicU64, Ordering};

use crate::key::SampleKey;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a started voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    pub(crate) fn next() -> VoiceId {
        VoiceId(NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to start a sample. Every field other than `note` overrides the
/// instrument's configuration for this one event.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleStart {
    /// The registry key to play.
    pub note: SampleKey,
    pub velocity: Option<f32>,
    /// Detune in cents.
    pub detune: Option<f32>,
    /// Release time in seconds.
    pub decay_time: Option<f64>,
    pub lpf_cutoff_hz: Option<f32>,
    /// When to start, in seconds on the context clock. Defaults to now.
    pub time: Option<f64>,
    /// How long to play before releasing, in seconds.
    pub duration: Option<f64>,
    /// The key used to target this voice with a stop. Defaults to `note`.
    pub stop_id: Option<SampleKey>,
}

impl SampleStart {
    pub fn new<K: Into<SampleKey>>(note: K) -> Self {
        Self {
            note: note.into(),
            velocity: None,
            detune: None,
            decay_time: None,
            lpf_cutoff_hz: None,
            time: None,
            duration: None,
            stop_id: None,
        }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune = Some(cents);
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

    pub fn at(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_stop_id<K: Into<SampleKey>>(mut self, stop_id: K) -> Self {
        self.stop_id = Some(stop_id.into());
        self
    }

    /// The key a stop has to name to release this voice.
    pub fn effective_stop_id(&self) -> &SampleKey {
        self.stop_id.as_ref().unwrap_or(&self.note)
    }
}

/// A request to release voices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleStop {
    /// The voices to release. None releases every voice.
    pub stop_id: Option<SampleKey>,
    /// When to release, in seconds on the context clock. Defaults to now.
    pub time: Option<f64>,
}

impl SampleStop {
    pub fn new<K: Into<SampleKey>>(stop_id: K) -> Self {
        Self {
            stop_id: Some(stop_id.into()),
            time: None,
        }
    }

    pub fn at(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }
}

/// What `stop` was asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StopRequest {
    #[default]
    All,
    Sample(SampleStop),
}

impl StopRequest {
    /// Converts to the engine's form, where None means every voice.
    pub fn into_stop(self) -> Option<SampleStop> {
        match self {
            StopRequest::All => None,
            StopRequest::Sample(stop) => Some(stop),
        }
    }
}

impl From<()> for StopRequest {
    fn from(_: ()) -> Self {
        StopRequest::All
    }
}

impl From<SampleStop> for StopRequest {
    fn from(stop: SampleStop) -> Self {
        StopRequest::Sample(stop)
    }
}

impl From<Option<SampleStop>> for StopRequest {
    fn from(stop: Option<SampleStop>) -> Self {
        match stop {
            Some(stop) => StopRequest::Sample(stop),
            None => StopRequest::All,
        }
    }
}

macro_rules! impl_key_requests {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SampleStart {
                fn from(note: $t) -> Self {
                    SampleStart::new(note)
                }
            }

            impl From<$t> for StopRequest {
                fn from(stop_id: $t) -> Self {
                    StopRequest::Sample(SampleStop::new(stop_id))
                }
            }
        )*
    };
}

impl_key_requests!(SampleKey, &SampleKey, &str, String, u8, u16, u32, i8, i16, i32, i64);
