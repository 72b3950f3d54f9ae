// Tests for the file-based audio source and sample-rate conversion.

use anyhow::Result;
use hey_listen::audio::{resample, AudioFile, AudioSource, FileSource};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write_wav(dir: &TempDir, name: &str, seconds: u32, sample_rate: u32, channels: u16) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(seconds * sample_rate * channels as u32) {
        writer.write_sample((i % 100) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_audio_file_open_reads_spec() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "mono.wav", 2, 16000, 1);

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 32000);
    assert!((audio.duration_seconds - 2.0).abs() < 0.01);
    Ok(())
}

#[test]
fn test_audio_file_mono_fold_halves_stereo() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "stereo.wav", 1, 16000, 2);

    let audio = AudioFile::open(&path)?;
    let mono = audio.to_mono_f32();

    assert_eq!(mono.len(), 16000);
    assert!(mono.iter().all(|s| (-1.0..=1.0).contains(s)));
    Ok(())
}

#[tokio::test]
async fn test_file_source_yields_fixed_duration_chunks() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "two-seconds.wav", 2, 16000, 1);

    let mut source = FileSource::open(&path, 16000)?;

    let first = source.capture(Duration::from_secs(1)).await?;
    assert_eq!(first.samples.len(), 16000);
    assert_eq!(first.sample_rate, 16000);

    let second = source.capture(Duration::from_secs(1)).await?;
    assert_eq!(second.samples.len(), 16000);
    assert_eq!(source.remaining_samples(), 0);

    // Exhausted file surfaces as a capture failure
    assert!(source.capture(Duration::from_secs(1)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_file_source_resamples_to_target_rate() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "high-rate.wav", 1, 32000, 1);

    let mut source = FileSource::open(&path, 16000)?;
    let chunk = source.capture(Duration::from_secs(1)).await?;

    assert_eq!(chunk.sample_rate, 16000);
    assert_eq!(chunk.samples.len(), 16000);
    Ok(())
}

#[test]
fn test_resample_identity() {
    let input = vec![0.1, 0.2, 0.3];
    assert_eq!(resample(&input, 16000, 16000), input);
}

#[test]
fn test_resample_halves_sample_count() {
    let input = vec![0.5; 1000];
    let output = resample(&input, 32000, 16000);
    assert_eq!(output.len(), 500);
}

#[test]
fn test_resample_empty_input() {
    assert!(resample(&[], 32000, 16000).is_empty());
}
