use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One fixed-duration chunk of mono audio.
///
/// Produced by an [`AudioSource`], consumed by transcription and speaker
/// tagging within a single loop iteration, then discarded. Never persisted.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Source of fixed-duration audio chunks.
///
/// Implementations:
/// - [`MicSource`](super::MicSource): cpal microphone capture
/// - [`FileSource`](super::FileSource): WAV playback for batch runs and tests
#[async_trait]
pub trait AudioSource: Send {
    /// Capture one chunk of the requested duration.
    ///
    /// Live sources block for the full duration. Device errors surface as
    /// `Err`; the caller is expected to pause briefly and retry rather than
    /// terminate.
    async fn capture(&mut self, duration: Duration) -> Result<AudioChunk>;
}

/// Linear-interpolation resampling.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let src_idx_floor = src_idx.floor() as usize;
        let src_idx_ceil = (src_idx_floor + 1).min(input.len() - 1);
        let frac = src_idx - src_idx_floor as f64;

        let sample =
            input[src_idx_floor] * (1.0 - frac) as f32 + input[src_idx_ceil] * frac as f32;

        output.push(sample);
    }

    output
}
