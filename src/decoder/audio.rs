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
use std::io::Cursor;

use symphonia::core::audio::{AudioBuffer as SymphoniaBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::{DecodeError, Decoder};
use crate::buffer::AudioBuffer;
use crate::context::AudioContext;

/// Decodes WAV, FLAC, MP3, OGG and the other formats symphonia supports. The whole
/// first audio track is decoded into memory and resampled to the context's rate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn decode(
        &self,
        context: &AudioContext,
        bytes: Vec<u8>,
        hint: Option<&str>,
    ) -> Result<AudioBuffer, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(extension) = hint {
            probe_hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&probe_hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let decoder_opts: DecoderOptions = Default::default();
        let mut decoder = get_codecs()
            .make(&params, &decoder_opts)
            .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut sample_rate = params.sample_rate;

        loop {
            let packet = match next_packet(format_reader.as_mut()) {
                Ok(Some(packet)) => packet,
                Ok(None) => break,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    decoder.decode(&packet)?
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // A corrupt packet is dropped; the rest of the stream is still usable.
                    debug!(error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if sample_rate.is_none() {
                sample_rate = Some(decoded.spec().rate);
            }
            append_planar(decoded, &mut channels);
        }

        let sample_rate = sample_rate.ok_or(DecodeError::MissingSampleRate)?;
        let buffer = AudioBuffer::new(channels, sample_rate);
        if buffer.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(buffer.resampled(context.sample_rate()))
    }
}

/// Reads the next packet. `Ok(None)` means the end of the stream; some formats report it
/// as an unexpected EOF and some as a decode error.
fn next_packet(format_reader: &mut dyn FormatReader) -> Result<Option<Packet>, SymphoniaError> {
    match format_reader.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        Err(SymphoniaError::DecodeError(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Appends a decoded packet to the planar channel data, converting every sample format
/// to f32 in [-1.0, 1.0].
fn append_planar(decoded: AudioBufferRef, channels: &mut Vec<Vec<f32>>) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_planar(&buf, channels, |s| s),
        AudioBufferRef::F64(buf) => extend_planar(&buf, channels, |s| s as f32),
        AudioBufferRef::S8(buf) => extend_planar(&buf, channels, scale_s8),
        AudioBufferRef::S16(buf) => extend_planar(&buf, channels, scale_s16),
        AudioBufferRef::S24(buf) => extend_planar(&buf, channels, |s| scale_s24(s.inner())),
        AudioBufferRef::S32(buf) => extend_planar(&buf, channels, scale_s32),
        AudioBufferRef::U8(buf) => extend_planar(&buf, channels, scale_u8),
        AudioBufferRef::U16(buf) => extend_planar(&buf, channels, scale_u16),
        AudioBufferRef::U24(buf) => extend_planar(&buf, channels, |s| scale_u24(s.inner())),
        AudioBufferRef::U32(buf) => extend_planar(&buf, channels, scale_u32),
    }
}

fn extend_planar<T, F>(buf: &SymphoniaBuffer<T>, channels: &mut Vec<Vec<f32>>, convert: F)
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    let planes = buf.planes();
    let planes = planes.planes();
    if channels.len() < planes.len() {
        // Keep channels aligned if a stream adds channels part way through.
        let existing = channels.first().map(|c| c.len()).unwrap_or(0);
        channels.resize(planes.len(), vec![0.0; existing]);
    }
    for (channel, plane) in channels.iter_mut().zip(planes.iter()) {
        channel.extend(plane[..frames].iter().map(|s| convert(*s)));
    }
}

#[inline]
pub(crate) fn scale_s8(sample: i8) -> f32 {
    sample as f32 / (1i64 << 7) as f32
}

#[inline]
pub(crate) fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
pub(crate) fn scale_s24(sample: i32) -> f32 {
    sample as f32 / (1i64 << 23) as f32
}

#[inline]
pub(crate) fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

#[inline]
pub(crate) fn scale_u8(sample: u8) -> f32 {
    (sample as f32 / u8::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u16(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u24(sample: u32) -> f32 {
    let max = (1u32 << 24) - 1;
    (sample as f32 / max as f32) * 2.0 - 1.0
}

#[inline]
pub(crate) fn scale_u32(sample: u32) -> f32 {
    (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{wav_bytes, wav_bytes_i16};

    #[test]
    fn test_decode_float_wav() {
        let context = AudioContext::new(44100, 2);
        let left: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let bytes = wav_bytes(&[left.clone(), right.clone()], 44100);

        let buffer = SymphoniaDecoder
            .decode(&context, bytes, Some("wav"))
            .unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.frames(), 1000);
        assert_eq!(buffer.channel(0).unwrap(), left.as_slice());
        assert_eq!(buffer.channel(1).unwrap(), right.as_slice());
    }

    #[test]
    fn test_decode_int_wav_without_hint() {
        let context = AudioContext::new(22050, 1);
        let bytes = wav_bytes_i16(&[vec![i16::MAX, 0, i16::MIN, 16384]], 22050);

        let buffer = SymphoniaDecoder.decode(&context, bytes, None).unwrap();
        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples.len(), 4);
        assert!((samples[0] - 1.0).abs() < 1e-3);
        assert_eq!(samples[1], 0.0);
        assert_eq!(samples[2], -1.0);
        assert_eq!(samples[3], 0.5);
    }

    #[test]
    fn test_decode_resamples_to_context_rate() {
        let context = AudioContext::new(48000, 2);
        let bytes = wav_bytes(&[vec![0.25; 4410]], 44100);

        let buffer = SymphoniaDecoder
            .decode(&context, bytes, Some("wav"))
            .unwrap();
        assert_eq!(buffer.sample_rate(), 48000);
        assert_eq!(buffer.frames(), 4800);
        assert!(buffer.channel(0).unwrap().iter().all(|s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let context = AudioContext::new(44100, 2);
        let result = SymphoniaDecoder.decode(&context, b"definitely not audio".to_vec(), Some("wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale_s8(i8::MIN), -1.0);
        assert_eq!(scale_s16(0), 0.0);
        assert_eq!(scale_s24(1 << 22), 0.5);
        assert_eq!(scale_s32(i32::MIN), -1.0);
        assert_eq!(scale_u8(0), -1.0);
        assert_eq!(scale_u16(u16::MAX), 1.0);
        assert_eq!(scale_u24((1 << 24) - 1), 1.0);
        assert_eq!(scale_u32(0), -1.0);
    }
}
