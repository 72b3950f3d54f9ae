use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Process-wide configuration, loaded once at startup and passed to each
/// component at construction. Layered: optional file, then environment
/// variables prefixed with `HEY_LISTEN` (`HEY_LISTEN_STORAGE__URL`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Absent section disables vector storage entirely; the pipeline then
    /// runs in local mode and only logs transcriptions.
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Duration of each captured chunk in seconds
    #[serde(default = "default_chunk_duration_secs")]
    pub chunk_duration_secs: u64,
    /// Sample rate the pipeline runs at (Whisper expects 16kHz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper model name, resolved to `ggml-{model}.bin` under `models_dir`
    #[serde(default = "default_model")]
    pub model: String,
    /// Explicit model file path; overrides `model`/`models_dir` resolution
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Directory holding downloaded models (default: ~/.hey-listen/models)
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub use_gpu: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Qdrant endpoint, e.g. http://localhost:6334
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Capacity bound: the collection is held at or under this many records
    #[serde(default = "default_max_records")]
    pub max_records: u64,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint (POST, JSON)
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Expected vector dimension; every returned embedding is validated
    /// against it and the collection is created with it
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_chunk_duration_secs() -> u64 {
    15
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_model() -> String {
    "tiny".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_collection() -> String {
    "hey-listen-transcriptions".to_string()
}

fn default_max_records() -> u64 {
    120
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: default_chunk_duration_secs(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            model_path: None,
            models_dir: None,
            language: default_language(),
            use_gpu: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the environment.
    ///
    /// With no explicit path, `config/hey-listen.{toml,yaml,json}` is used
    /// when present. Environment variables always apply on top.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::with_name(p),
            None => config::File::with_name("config/hey-listen").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("HEY_LISTEN").separator("__"))
            .build()
            .context("Failed to load configuration")?;

        let cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.chunk_duration_secs == 0 {
            bail!("audio.chunk_duration_secs must be greater than 0");
        }
        if self.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be greater than 0");
        }
        if self.transcription.model.is_empty() && self.transcription.model_path.is_none() {
            bail!("transcription.model or transcription.model_path must be set");
        }
        if let Some(storage) = &self.storage {
            if storage.url.is_empty() {
                bail!("storage.url cannot be empty");
            }
            if storage.max_records == 0 {
                bail!("storage.max_records must be greater than 0");
            }
            if storage.embedding.endpoint.is_empty() {
                bail!("storage.embedding.endpoint cannot be empty");
            }
            if storage.embedding.dimension == 0 {
                bail!("storage.embedding.dimension must be greater than 0");
            }
        }
        Ok(())
    }
}
