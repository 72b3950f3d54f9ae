use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::audio::AudioSource;
use crate::speaker::SpeakerTagger;
use crate::store::{StoreOutcome, TranscriptEvent, TranscriptStore};
use crate::transcribe::SpeechToText;

/// Pipeline counters shared with the HTTP status endpoint.
#[derive(Debug, Default)]
pub struct PipelineStats {
    running: AtomicBool,
    chunks_captured: AtomicUsize,
    capture_failures: AtomicUsize,
    chunks_transcribed: AtomicUsize,
    records_stored: AtomicUsize,
    store_failures: AtomicUsize,
    last_chunk_unix_ms: AtomicI64,
}

/// Point-in-time view of [`PipelineStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub running: bool,
    pub chunks_captured: usize,
    pub capture_failures: usize,
    pub chunks_transcribed: usize,
    pub records_stored: usize,
    pub store_failures: usize,
    pub last_chunk_at: Option<DateTime<Utc>>,
}

impl PipelineStats {
    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    fn chunk_captured(&self) {
        self.chunks_captured.fetch_add(1, Ordering::SeqCst);
        self.last_chunk_unix_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    fn capture_failed(&self) {
        self.capture_failures.fetch_add(1, Ordering::SeqCst);
    }

    fn chunk_transcribed(&self) {
        self.chunks_transcribed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_stored(&self) {
        self.records_stored.fetch_add(1, Ordering::SeqCst);
    }

    fn store_failed(&self) {
        self.store_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last_ms = self.last_chunk_unix_ms.load(Ordering::SeqCst);
        StatsSnapshot {
            running: self.running.load(Ordering::SeqCst),
            chunks_captured: self.chunks_captured.load(Ordering::SeqCst),
            capture_failures: self.capture_failures.load(Ordering::SeqCst),
            chunks_transcribed: self.chunks_transcribed.load(Ordering::SeqCst),
            records_stored: self.records_stored.load(Ordering::SeqCst),
            store_failures: self.store_failures.load(Ordering::SeqCst),
            last_chunk_at: if last_ms == 0 {
                None
            } else {
                Utc.timestamp_millis_opt(last_ms).single()
            },
        }
    }
}

/// The ingestion loop: capture → transcribe → tag → store, one chunk at a
/// time, strictly sequential. No failure in any step terminates the loop;
/// it only ends when the shutdown flag is set.
pub struct AudioWorker {
    source: Box<dyn AudioSource>,
    transcriber: Box<dyn SpeechToText>,
    tagger: Box<dyn SpeakerTagger>,
    /// `None` runs the pipeline in local mode: transcriptions are logged
    /// and discarded.
    store: Option<Box<dyn TranscriptStore>>,
    chunk_duration: Duration,
    stats: Arc<PipelineStats>,
    shutdown: Arc<AtomicBool>,
}

impl AudioWorker {
    pub fn new(
        source: Box<dyn AudioSource>,
        transcriber: Box<dyn SpeechToText>,
        tagger: Box<dyn SpeakerTagger>,
        store: Option<Box<dyn TranscriptStore>>,
        chunk_duration: Duration,
    ) -> Self {
        Self {
            source,
            transcriber,
            tagger,
            store,
            chunk_duration,
            stats: Arc::new(PipelineStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Setting the returned flag ends [`run`](Self::run) at the next
    /// iteration boundary; a chunk in flight still completes.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub async fn run(&mut self) {
        self.stats.set_running(true);

        while !self.shutdown.load(Ordering::SeqCst) {
            self.tick().await;
            sleep(Duration::from_millis(100)).await;
        }

        self.stats.set_running(false);
        info!("Ingestion loop stopped");
    }

    /// One capture → transcribe → tag → store iteration.
    pub async fn tick(&mut self) {
        let chunk = match self.source.capture(self.chunk_duration).await {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Audio capture failed, retrying: {}", e);
                self.stats.capture_failed();
                sleep(Duration::from_secs(1)).await;
                return;
            }
        };
        self.stats.chunk_captured();
        debug!(
            "Captured {:.1}s chunk at {}Hz",
            chunk.duration_seconds(),
            chunk.sample_rate
        );

        let text = self.transcriber.transcribe(&chunk);
        if text.trim().is_empty() {
            debug!("No speech detected, continuing");
            return;
        }
        self.stats.chunk_transcribed();

        let speaker = self.tagger.assign_speaker(&chunk);
        let event = TranscriptEvent::new(text, speaker);

        match &self.store {
            Some(store) => match store.store(&event).await {
                Ok(StoreOutcome::Stored) => {
                    self.stats.record_stored();
                    info!(
                        "[{}] {} → stored as {}",
                        event.speaker,
                        preview(&event.text),
                        event.record_id()
                    );
                }
                Ok(StoreOutcome::Skipped) => {
                    debug!("[{}] {} → skipped", event.speaker, preview(&event.text));
                }
                Err(e) => {
                    self.stats.store_failed();
                    error!(
                        "[{}] {} → storage failed: {}",
                        event.speaker,
                        preview(&event.text),
                        e
                    );
                }
            },
            None => {
                info!("[{}] {} → local only", event.speaker, preview(&event.text));
            }
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= 60 {
        text.to_string()
    } else {
        let head: String = text.chars().take(60).collect();
        format!("{}...", head)
    }
}
