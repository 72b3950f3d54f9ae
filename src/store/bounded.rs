use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use super::embedding::Embedder;
use super::index::{IndexPoint, VectorIndex};
use super::{StoreOutcome, TranscriptEvent, TranscriptStore};

/// Capacity-bounded transcript storage: embed, evict the oldest record when
/// the index is full, insert.
///
/// The evict-then-insert pair is one logical operation behind [`store`], but
/// the underlying service offers no transaction: the two remote calls can
/// interleave with a crash, and a failed eviction does not block the insert.
/// Either way the collection can transiently hold one record more than
/// `max_records` until a later eviction catches up.
///
/// [`store`]: TranscriptStore::store
pub struct BoundedStore {
    index: Box<dyn VectorIndex>,
    embedder: Box<dyn Embedder>,
    max_records: u64,
}

impl BoundedStore {
    pub fn new(
        index: Box<dyn VectorIndex>,
        embedder: Box<dyn Embedder>,
        max_records: u64,
    ) -> Self {
        Self {
            index,
            embedder,
            max_records,
        }
    }

    async fn evict_oldest(&self) {
        match self.index.oldest().await {
            Ok(Some(candidate)) => match self.index.delete(&candidate.id).await {
                Ok(()) => info!(
                    "Evicted oldest record {} (timestamp {})",
                    candidate.id, candidate.timestamp
                ),
                Err(e) => warn!("Eviction delete failed, inserting anyway: {}", e),
            },
            Ok(None) => warn!("Index reported full but no eviction candidate found"),
            Err(e) => warn!("Eviction scan failed, inserting anyway: {}", e),
        }
    }
}

#[async_trait]
impl TranscriptStore for BoundedStore {
    async fn store(&self, event: &TranscriptEvent) -> Result<StoreOutcome> {
        if event.text.trim().is_empty() {
            debug!("Skipping empty transcription");
            return Ok(StoreOutcome::Skipped);
        }

        let vector = self
            .embedder
            .embed(&event.text)
            .await
            .context("Embedding failed")?;

        match self.index.count().await {
            Ok(count) if count >= self.max_records => self.evict_oldest().await,
            Ok(_) => {}
            Err(e) => warn!("Could not determine index size, skipping eviction: {}", e),
        }

        let point = IndexPoint {
            id: event.record_id().to_string(),
            vector,
            payload: json!({
                "text": event.text,
                "speaker": event.speaker,
                "timestamp": event.timestamp,
                "created_at": event.created_at(),
                "title": event.title(),
                "summary": event.summary(),
            }),
        };

        self.index.insert(point).await.context("Insert failed")?;

        Ok(StoreOutcome::Stored)
    }
}
