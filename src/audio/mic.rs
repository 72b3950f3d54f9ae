use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::source::{resample, AudioChunk, AudioSource};

/// Microphone capture backed by cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// that folds incoming frames to mono and forwards them over a channel.
/// `capture` drains the channel until one chunk's worth of samples has
/// accumulated, then resamples to the target rate when the device runs at a
/// different one.
pub struct MicSource {
    target_sample_rate: u32,
    device_sample_rate: u32,
    frames: mpsc::Receiver<Vec<f32>>,
    stop: Arc<AtomicBool>,
}

impl MicSource {
    pub fn new(target_sample_rate: u32) -> Result<Self> {
        let (frame_tx, frame_rx) = mpsc::channel::<Vec<f32>>(64);
        let (init_tx, init_rx) = std::sync::mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            capture_thread(target_sample_rate, frame_tx, init_tx, thread_stop);
        });

        let device_sample_rate = init_rx
            .recv()
            .context("Capture thread exited before reporting a device")??;

        Ok(Self {
            target_sample_rate,
            device_sample_rate,
            frames: frame_rx,
            stop,
        })
    }
}

#[async_trait]
impl AudioSource for MicSource {
    async fn capture(&mut self, duration: Duration) -> Result<AudioChunk> {
        let needed = (duration.as_secs_f64() * self.device_sample_rate as f64) as usize;
        let mut samples = Vec::with_capacity(needed);

        while samples.len() < needed {
            match self.frames.recv().await {
                Some(frame) => samples.extend_from_slice(&frame),
                None => bail!("Audio capture thread stopped"),
            }
        }
        samples.truncate(needed);

        let samples = if self.device_sample_rate != self.target_sample_rate {
            resample(&samples, self.device_sample_rate, self.target_sample_rate)
        } else {
            samples
        };

        Ok(AudioChunk {
            samples,
            sample_rate: self.target_sample_rate,
        })
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Owns the cpal stream for the lifetime of the source. Initialization
/// errors are reported back through `init_tx` so `MicSource::new` can fail.
fn capture_thread(
    target_rate: u32,
    frame_tx: mpsc::Sender<Vec<f32>>,
    init_tx: std::sync::mpsc::Sender<Result<u32>>,
    stop: Arc<AtomicBool>,
) {
    let built = build_stream(target_rate, frame_tx);

    match built {
        Ok((stream, device_rate)) => {
            let _ = init_tx.send(Ok(device_rate));
            while !stop.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(100));
            }
            drop(stream);
        }
        Err(e) => {
            let _ = init_tx.send(Err(e));
        }
    }
}

fn build_stream(target_rate: u32, frame_tx: mpsc::Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();

    let device = host
        .default_input_device()
        .context("No input device available")?;

    info!(
        "Using audio input device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let default_config = device
        .default_input_config()
        .context("Failed to get default input config")?;

    let mut config: StreamConfig = default_config.into();

    // Prefer the target rate when the device supports it; otherwise keep the
    // device default and resample on the consumer side.
    let supported = device
        .supported_input_configs()
        .context("Failed to query supported input configs")?;
    for supported_config in supported {
        if supported_config.min_sample_rate().0 <= target_rate
            && supported_config.max_sample_rate().0 >= target_rate
        {
            config.sample_rate = cpal::SampleRate(target_rate);
            break;
        }
    }

    info!(
        "Audio config: {} channels at {}Hz",
        config.channels, config.sample_rate.0
    );

    let channels = config.channels as usize;
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                        .collect()
                };
                // The audio callback must not block; a lagging consumer
                // loses frames.
                let _ = frame_tx.try_send(mono);
            },
            |err| warn!("Audio stream error: {}", err),
            None,
        )
        .context("Failed to build input stream")?;

    stream.play().context("Failed to start audio stream")?;

    Ok((stream, config.sample_rate.0))
}
