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

//! Decoding raw sample bytes into playable buffers.

mod audio;
mod error;

pub use audio::SymphoniaDecoder;
pub use error::DecodeError;

use crate::buffer::AudioBuffer;
use crate::context::AudioContext;

/// Turns encoded audio into a buffer at the context's sample rate.
///
/// Decoding is CPU bound; the load pipeline runs it on the blocking thread pool.
pub trait Decoder: Send + Sync {
    /// Decodes the bytes. `hint` is the file extension of the source, if known.
    fn decode(
        &self,
        context: &AudioContext,
        bytes: Vec<u8>,
        hint: Option<&str>,
    ) -> Result<AudioBuffer, DecodeError>;
}

/// Returns the extension of an identifier, ignoring any query string or fragment.
pub fn extension_hint(id: &str) -> Option<&str> {
    let path = id.split(['?', '#']).next().unwrap_or(id);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}
