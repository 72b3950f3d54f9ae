use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, error, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::AudioChunk;
use crate::config::TranscriptionConfig;

/// Speech-to-text over one audio chunk.
///
/// A failed model call is not an error to the caller: it comes back as the
/// empty string, which downstream treats as "nothing to do".
pub trait SpeechToText: Send {
    fn transcribe(&mut self, chunk: &AudioChunk) -> String;
}

/// Whisper-backed transcription. The model is loaded once at construction
/// and held for the lifetime of the process.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    language: String,
}

impl WhisperTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let model_path = resolve_model_path(config)?;

        info!("Loading Whisper model from: {}", model_path.display());

        let ctx_params = WhisperContextParameters {
            use_gpu: config.use_gpu,
            ..Default::default()
        };

        let ctx = WhisperContext::new_with_params(&model_path.to_string_lossy(), ctx_params)
            .context("Failed to load Whisper model")?;

        info!("Whisper model loaded (GPU: {})", config.use_gpu);

        Ok(Self {
            ctx,
            language: config.language.clone(),
        })
    }

    fn run(&self, samples: &[f32]) -> Result<String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if !self.language.is_empty() && self.language != "auto" {
            params.set_language(Some(&self.language));
        }
        params.set_translate(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Drop annotations like [BLANK_AUDIO] and (coughs)
        params.set_suppress_blank(true);
        params.set_suppress_non_speech_tokens(true);

        let mut state = self
            .ctx
            .create_state()
            .context("Failed to create Whisper state")?;

        state
            .full(params, samples)
            .context("Failed to run Whisper transcription")?;

        let num_segments = state
            .full_n_segments()
            .context("Failed to get segment count")?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .context("Failed to get segment text")?;
            text.push_str(&segment);
            text.push(' ');
        }

        Ok(text.trim().to_string())
    }
}

impl SpeechToText for WhisperTranscriber {
    fn transcribe(&mut self, chunk: &AudioChunk) -> String {
        // Whisper rejects inputs shorter than one second; pad with silence.
        let min_samples = chunk.sample_rate as usize;
        let result = if chunk.samples.len() < min_samples {
            let mut padded = chunk.samples.clone();
            padded.resize(min_samples, 0.0);
            self.run(&padded)
        } else {
            self.run(&chunk.samples)
        };

        match result {
            Ok(text) => {
                if !text.is_empty() {
                    debug!("Transcribed: {:.50}", text);
                }
                text
            }
            Err(e) => {
                error!("Transcription failed: {}", e);
                String::new()
            }
        }
    }
}

fn resolve_model_path(config: &TranscriptionConfig) -> Result<PathBuf> {
    if let Some(path) = &config.model_path {
        return Ok(path.clone());
    }

    let models_dir = match &config.models_dir {
        Some(dir) => dir.clone(),
        None => dirs::home_dir()
            .context("Failed to get home directory")?
            .join(".hey-listen")
            .join("models"),
    };

    let model_filename = format!("ggml-{}.bin", config.model);
    let model_path = models_dir.join(&model_filename);

    if !model_path.exists() {
        anyhow::bail!(
            "Model file not found: {}\n\
            Download it from https://huggingface.co/ggerganov/whisper.cpp/tree/main\n\
            and place it in: {}",
            model_filename,
            models_dir.display()
        );
    }

    Ok(model_path)
}
