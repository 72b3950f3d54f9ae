pub mod audio;
pub mod config;
pub mod http;
pub mod speaker;
pub mod store;
pub mod transcribe;
pub mod worker;

pub use audio::{AudioChunk, AudioFile, AudioSource, FileSource, MicSource};
pub use config::Config;
pub use http::{create_router, AppState};
pub use speaker::{ConstantTagger, SpeakerTagger};
pub use store::{
    BoundedStore, Embedder, HttpEmbedder, QdrantIndex, StoreOutcome, TranscriptEvent,
    TranscriptStore, VectorIndex,
};
pub use transcribe::{SpeechToText, WhisperTranscriber};
pub use worker::{AudioWorker, PipelineStats, StatsSnapshot};
