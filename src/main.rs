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
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use smplr::player::DEFAULT_RELEASE_SECONDS;
use smplr::{AudioContext, InstrumentDefinition, SampleStart, Sampler};

/// Frames rendered per block when writing to disk.
const RENDER_BLOCK_FRAMES: usize = 1024;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample-based instrument."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads an instrument and reports which samples loaded.
    Check {
        /// The path to the instrument definition.
        instrument_path: PathBuf,
    },
    /// Renders a sequence of notes to a WAV file.
    Render {
        /// The path to the instrument definition.
        instrument_path: PathBuf,
        /// The WAV file to write.
        output_path: PathBuf,
        /// The notes to play, in order. For example, 60,62,snare.
        #[arg(short, long, value_delimiter = ',', required = true)]
        notes: Vec<String>,
        /// The velocity of every note.
        #[arg(short, long, default_value_t = 100.0)]
        velocity: f32,
        /// The time between note starts.
        #[arg(short, long, default_value = "500ms")]
        spacing: String,
        /// How long each note is held.
        #[arg(short, long, default_value = "1s")]
        length: String,
        /// The sample rate of the output.
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
        /// The number of output channels.
        #[arg(short, long, default_value_t = 2)]
        channels: u16,
    },
    /// Lists the keys an instrument declares.
    Keys {
        /// The path to the instrument definition.
        instrument_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { instrument_path } => {
            let sampler = load(&instrument_path, AudioContext::new(44100, 2)).await?;
            let summary = sampler.load_summary().ok_or("instrument did not load")?;

            println!("Loaded (count: {}):", summary.loaded().len());
            for key in summary.loaded() {
                println!("- {}", key);
            }

            if !summary.skipped().is_empty() {
                println!("\nSkipped (count: {}):", summary.skipped().len());
                for skipped in summary.skipped() {
                    println!("- {} ({}): {}", skipped.key, skipped.id, skipped.reason);
                }
            }
        }
        Commands::Render {
            instrument_path,
            output_path,
            notes,
            velocity,
            spacing,
            length,
            sample_rate,
            channels,
        } => {
            let spacing = parse_duration("spacing", &spacing)?;
            let length = parse_duration("length", &length)?;

            let context = AudioContext::new(sample_rate, channels);
            let sampler = load(&instrument_path, context.clone()).await?;

            for (i, note) in notes.iter().enumerate() {
                let start = SampleStart::new(note.as_str())
                    .with_velocity(velocity)
                    .at(i as f64 * spacing.as_secs_f64())
                    .with_duration(length.as_secs_f64());
                if sampler.start(start).is_none() {
                    warn!(note = %note, "No sample for note");
                }
            }

            let release = sampler
                .config()
                .decay_time()
                .unwrap_or(DEFAULT_RELEASE_SECONDS);
            let total = spacing.as_secs_f64() * notes.len().saturating_sub(1) as f64
                + length.as_secs_f64()
                + release;
            let total_frames = context.frame_at(total) as usize;

            let spec = hound::WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            let mut writer = hound::WavWriter::create(&output_path, spec)?;
            let mut rendered = 0;
            while rendered < total_frames {
                let frames = RENDER_BLOCK_FRAMES.min(total_frames - rendered);
                for sample in context.render_interleaved(frames) {
                    writer.write_sample(sample)?;
                }
                rendered += frames;
            }
            writer.finalize()?;

            info!(
                notes = notes.len(),
                frames = total_frames,
                path = %output_path.display(),
                "Rendered"
            );
            println!(
                "Wrote {:.2}s to {}",
                total_frames as f64 / sample_rate as f64,
                output_path.display()
            );
        }
        Commands::Keys { instrument_path } => {
            let definition = InstrumentDefinition::from_file(&instrument_path)?;
            let keys = definition.keys();

            if keys.is_empty() {
                println!("No keys found in {}.", instrument_path.display());
                return Ok(());
            }

            println!("Keys (count: {}):", keys.len());
            for key in keys {
                let file = definition
                    .samples()
                    .get(&key.to_string())
                    .map(String::as_str)
                    .unwrap_or_default();
                println!("- {}: {}", key, file);
            }
        }
    }

    Ok(())
}

/// Loads the instrument at `path` into `context` and waits for its samples.
async fn load(path: &Path, context: AudioContext) -> Result<Sampler, Box<dyn Error>> {
    let definition = InstrumentDefinition::from_file(path)?;
    let definition_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let sampler = Sampler::new(context, definition.into_options(definition_dir)?);

    sampler.loaded().await?;
    Ok(sampler)
}

fn parse_duration(name: &str, value: &str) -> Result<Duration, Box<dyn Error>> {
    Ok(DurationString::from_string(value.to_string())
        .map_err(|e| format!("invalid {} {}: {}", name, value, e))?
        .into())
}
