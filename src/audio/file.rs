use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hound::WavReader;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::source::{resample, AudioChunk, AudioSource};

/// A WAV file decoded into memory.
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Fold interleaved channels to mono f32 in [-1.0, 1.0].
    pub fn to_mono_f32(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self
                .samples
                .iter()
                .map(|&s| s as f32 / i16::MAX as f32)
                .collect();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks(channels)
            .map(|frame| {
                let sum: f32 = frame.iter().map(|&s| s as f32 / i16::MAX as f32).sum();
                sum / channels as f32
            })
            .collect()
    }
}

/// Replays a WAV file as fixed-duration chunks, for batch processing and
/// tests. `capture` fails once the file is exhausted.
pub struct FileSource {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, target_sample_rate: u32) -> Result<Self> {
        let file = AudioFile::open(path)?;
        let mono = file.to_mono_f32();

        let samples = if file.sample_rate != target_sample_rate {
            resample(&mono, file.sample_rate, target_sample_rate)
        } else {
            mono
        };

        Ok(Self {
            samples,
            sample_rate: target_sample_rate,
            cursor: 0,
        })
    }

    pub fn remaining_samples(&self) -> usize {
        self.samples.len() - self.cursor
    }
}

#[async_trait]
impl AudioSource for FileSource {
    async fn capture(&mut self, duration: Duration) -> Result<AudioChunk> {
        if self.cursor >= self.samples.len() {
            bail!("Audio file exhausted");
        }

        let chunk_len = (duration.as_secs_f64() * self.sample_rate as f64) as usize;
        let end = (self.cursor + chunk_len).min(self.samples.len());
        let samples = self.samples[self.cursor..end].to_vec();
        self.cursor = end;

        Ok(AudioChunk {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}
