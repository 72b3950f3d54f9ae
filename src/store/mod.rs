//! Capacity-bounded transcript storage.
//!
//! A [`TranscriptEvent`] is embedded through an external embeddings endpoint
//! and upserted into a vector index that is held at or under a configured
//! record count, evicting the oldest record when full.

mod bounded;
mod embedding;
mod index;

pub use bounded::BoundedStore;
pub use embedding::{Embedder, HttpEmbedder};
pub use index::{EvictionCandidate, IndexPoint, QdrantIndex, VectorIndex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

/// A transcription ready for storage. Created once per successfully
/// transcribed chunk; immutable; the vector index is the only record kept.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    pub text: String,
    pub speaker: String,
    /// Capture time, seconds since the Unix epoch
    pub timestamp: f64,
}

impl TranscriptEvent {
    pub fn new(text: String, speaker: String) -> Self {
        Self {
            text,
            speaker,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Deterministic record id for this event.
    ///
    /// The index only accepts integer or UUID ids, so the natural
    /// `transcript_{timestamp}_{speaker}` key is folded into a UUIDv5.
    pub fn record_id(&self) -> Uuid {
        let key = format!("transcript_{}_{}", self.timestamp as i64, self.speaker);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }

    /// Human-readable record title, local time.
    pub fn title(&self) -> String {
        let time_str = self
            .captured_at()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        format!("Transcription - Speaker {} at {}", self.speaker, time_str)
    }

    /// Truncated summary for the record metadata.
    pub fn summary(&self) -> String {
        let head: String = self.text.chars().take(100).collect();
        format!("Transcript from {}: {}...", self.speaker, head)
    }

    /// RFC3339 capture time, UTC.
    pub fn created_at(&self) -> String {
        self.captured_at().to_rfc3339()
    }

    fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt((self.timestamp * 1000.0) as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Result of one storage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Record embedded and inserted
    Stored,
    /// Empty or whitespace-only text; nothing was sent anywhere
    Skipped,
}

/// Persists transcript events. The ingestion loop only sees this trait, so
/// tests can substitute an in-memory recorder for the real index.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn store(&self, event: &TranscriptEvent) -> Result<StoreOutcome>;
}
