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
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File, FileFormat};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use super::SamplerOptions;
use crate::key::SampleKey;
use crate::loader::{BufferSource, BufferSpec};
use crate::storage::{DefaultStorage, FileStorage, HttpStorage};

/// A YAML representation of an instrument.
///
/// ```yaml
/// base_path: samples
/// volume: 100
/// decay_time: 300ms
/// samples:
///   "60": kick.wav
///   "62": snare.wav
/// ```
#[derive(Deserialize, Clone, Debug)]
pub struct InstrumentDefinition {
    /// Directory that sample paths are relative to. Relative to the definition file.
    base_path: Option<String>,

    /// Detune in cents.
    detune: Option<f32>,

    /// Instrument volume (0-127).
    volume: Option<f32>,

    /// Velocity for notes started without one.
    velocity: Option<f32>,

    /// Release time when a note is stopped, as a duration string (e.g. 300ms).
    decay_time: Option<String>,

    /// Low-pass filter cutoff.
    lpf_cutoff_hz: Option<f32>,

    /// The sample file for each key.
    #[serde(default)]
    samples: HashMap<String, String>,
}

impl InstrumentDefinition {
    /// Parses an instrument definition from a YAML file.
    pub fn from_file(path: &Path) -> Result<InstrumentDefinition, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .build()?
            .try_deserialize::<InstrumentDefinition>()?)
    }

    /// Parses an instrument definition from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<InstrumentDefinition, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<InstrumentDefinition>()?)
    }

    /// Returns the release time.
    pub fn decay_time(&self) -> Result<Option<Duration>, ConfigError> {
        match &self.decay_time {
            Some(decay_time) => Ok(Some(
                DurationString::from_string(decay_time.clone())
                    .map_err(|e| ConfigError::InvalidDuration(decay_time.clone(), e.to_string()))?
                    .into(),
            )),
            None => Ok(None),
        }
    }

    /// Returns the declared sample keys, sorted.
    pub fn keys(&self) -> Vec<SampleKey> {
        let mut keys: Vec<SampleKey> = self.samples.keys().map(SampleKey::from).collect();
        keys.sort();
        keys
    }

    /// Returns the sample file for each key.
    pub fn samples(&self) -> &HashMap<String, String> {
        &self.samples
    }

    /// Returns the directory sample files are read from, given the directory the
    /// definition was loaded from.
    pub fn sample_root(&self, definition_dir: &Path) -> PathBuf {
        match &self.base_path {
            Some(base_path) => definition_dir.join(base_path),
            None => definition_dir.to_path_buf(),
        }
    }

    /// Builds sampler options that load the samples from disk, or over HTTP for samples
    /// given as URLs.
    pub fn into_options(self, definition_dir: &Path) -> Result<SamplerOptions, ConfigError> {
        let decay_time = self.decay_time()?;
        let storage = DefaultStorage::new(
            FileStorage::new(self.sample_root(definition_dir)),
            HttpStorage::new(),
        );
        let buffers: BufferSpec = self
            .samples
            .into_iter()
            .map(|(key, file)| (SampleKey::from(key.as_str()), BufferSource::from(file)))
            .collect();

        let mut options = SamplerOptions::new()
            .with_storage(storage)
            .with_buffers(buffers);
        options.detune = self.detune;
        options.volume = self.volume;
        options.velocity = self.velocity;
        options.decay_time = decay_time.map(|d| d.as_secs_f64());
        options.lpf_cutoff_hz = self.lpf_cutoff_hz;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AudioContext;

    const YAML: &str = r#"
        base_path: samples
        detune: 25
        volume: 80
        velocity: 90
        decay_time: 300ms
        lpf_cutoff_hz: 8000
        samples:
          "60": kick.wav
          "62": snare.wav
          hat: hat.flac
    "#;

    #[test]
    fn test_deserialize() {
        let definition = InstrumentDefinition::from_yaml_str(YAML).unwrap();

        assert_eq!(
            definition.keys(),
            vec![
                SampleKey::from(60),
                SampleKey::from(62),
                SampleKey::from("hat")
            ]
        );
        assert_eq!(
            definition.decay_time().unwrap(),
            Some(Duration::from_millis(300))
        );
        assert_eq!(
            definition.sample_root(Path::new("/instruments")),
            PathBuf::from("/instruments/samples")
        );
        assert_eq!(definition.samples().get("hat").map(String::as_str), Some("hat.flac"));
    }

    #[test]
    fn test_into_options() {
        let definition = InstrumentDefinition::from_yaml_str(YAML).unwrap();
        let options = definition.into_options(Path::new("/instruments")).unwrap();

        let resolved = options.resolve(&AudioContext::new(44100, 2));
        assert_eq!(resolved.config.detune(), 25.0);
        assert_eq!(resolved.config.volume(), 80.0);
        assert_eq!(resolved.config.velocity(), 90.0);
        assert_eq!(resolved.config.decay_time(), Some(0.3));
        assert_eq!(resolved.config.lpf_cutoff_hz(), Some(8000.0));
        match resolved.buffers {
            BufferSpec::Sources(sources) => {
                assert_eq!(sources.len(), 3);
                assert!(matches!(
                    sources.get(&SampleKey::from(62)),
                    Some(BufferSource::Identifier(id)) if id == "snare.wav"
                ));
            }
            BufferSpec::Loader(_) => panic!("expected sources"),
        }
    }

    #[test]
    fn test_minimal() {
        let definition = InstrumentDefinition::from_yaml_str("samples: {}").unwrap();
        assert!(definition.keys().is_empty());
        assert_eq!(definition.decay_time().unwrap(), None);
        assert_eq!(
            definition.sample_root(Path::new("instruments")),
            PathBuf::from("instruments")
        );
    }

    #[test]
    fn test_invalid_decay_time() {
        let definition =
            InstrumentDefinition::from_yaml_str("decay_time: soon\nsamples: {}").unwrap();
        assert!(matches!(
            definition.decay_time(),
            Err(ConfigError::InvalidDuration(value, _)) if value == "soon"
        ));
        assert!(definition.into_options(Path::new(".")).is_err());
    }

    #[test]
    fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drums.yaml");
        std::fs::write(&path, YAML)?;

        let definition = InstrumentDefinition::from_file(&path)?;
        assert_eq!(definition.keys().len(), 3);

        assert!(InstrumentDefinition::from_file(&dir.path().join("missing.yaml")).is_err());
        Ok(())
    }
}
