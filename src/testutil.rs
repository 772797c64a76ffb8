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
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::buffer::AudioBuffer;

/// Encodes planar f32 channels as a 32-bit float WAV file in memory.
pub fn wav_bytes(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let spec = WavSpec {
            channels: channels.len() as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        for frame in 0..frames {
            for channel in channels {
                writer.write_sample(channel[frame]).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// Encodes planar i16 channels as a 16-bit PCM WAV file in memory.
pub fn wav_bytes_i16(channels: &[Vec<i16>], sample_rate: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let spec = WavSpec {
            channels: channels.len() as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        for frame in 0..frames {
            for channel in channels {
                writer.write_sample(channel[frame]).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// Writes planar f32 channels to a WAV file on disk.
pub fn write_wav(path: &Path, channels: &[Vec<f32>], sample_rate: u32) -> Result<(), Box<dyn Error>> {
    let bytes = wav_bytes(channels, sample_rate);
    std::io::Write::write_all(&mut File::create(path)?, &bytes)?;
    Ok(())
}

/// A mono buffer holding a constant value.
pub fn constant_buffer(value: f32, frames: usize, sample_rate: u32) -> AudioBuffer {
    AudioBuffer::new(vec![vec![value; frames]], sample_rate)
}

/// Returns the peak absolute value across all channels.
pub fn peak(block: &[Vec<f32>]) -> f32 {
    block
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |peak, s| peak.max(s.abs()))
}

/// Serves the given files over HTTP on a local port until the test ends. Paths starting
/// with `/error` answer 500 and unknown paths answer 404. Returns the base URL.
pub async fn serve_http(files: Vec<(&'static str, Vec<u8>)>) -> String {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let files: Arc<HashMap<&'static str, Vec<u8>>> = Arc::new(files.into_iter().collect());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let files = files.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/");

                let (status, body) = match files.get(path) {
                    Some(body) => ("200 OK", body.clone()),
                    None if path.starts_with("/error") => {
                        ("500 Internal Server Error", Vec::new())
                    }
                    None => ("404 Not Found", Vec::new()),
                };
                let header = format!(
                    "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
