// Integration tests for the ingestion loop.
//
// Capture, transcription, and storage are scripted stubs; the tests verify
// the loop's recovery behavior and that storage is attempted exactly once
// per non-empty transcription.

use anyhow::{bail, Result};
use async_trait::async_trait;
use hey_listen::audio::{AudioChunk, AudioSource};
use hey_listen::speaker::ConstantTagger;
use hey_listen::store::{StoreOutcome, TranscriptEvent, TranscriptStore};
use hey_listen::transcribe::SpeechToText;
use hey_listen::worker::AudioWorker;
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHUNK_DURATION: Duration = Duration::from_secs(5);

fn silence() -> AudioChunk {
    AudioChunk {
        samples: vec![0.0; 16000],
        sample_rate: 16000,
    }
}

/// Pops scripted capture results; yields endless silence once exhausted.
struct ScriptedSource {
    script: VecDeque<Result<AudioChunk>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<AudioChunk>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

#[async_trait]
impl AudioSource for ScriptedSource {
    async fn capture(&mut self, _duration: Duration) -> Result<AudioChunk> {
        match self.script.pop_front() {
            Some(item) => item,
            None => Ok(silence()),
        }
    }
}

/// Pops scripted transcriptions; returns the empty string once exhausted.
struct ScriptedStt {
    script: VecDeque<String>,
}

impl ScriptedStt {
    fn new(texts: &[&str]) -> Self {
        Self {
            script: texts.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl SpeechToText for ScriptedStt {
    fn transcribe(&mut self, _chunk: &AudioChunk) -> String {
        self.script.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Default)]
struct RecordingStore {
    events: Arc<Mutex<Vec<TranscriptEvent>>>,
}

impl RecordingStore {
    fn texts(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }
}

#[async_trait]
impl TranscriptStore for RecordingStore {
    async fn store(&self, event: &TranscriptEvent) -> Result<StoreOutcome> {
        if event.text.trim().is_empty() {
            return Ok(StoreOutcome::Skipped);
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(StoreOutcome::Stored)
    }
}

struct FailingStore;

#[async_trait]
impl TranscriptStore for FailingStore {
    async fn store(&self, _event: &TranscriptEvent) -> Result<StoreOutcome> {
        bail!("index unreachable")
    }
}

fn worker_with(
    source: ScriptedSource,
    stt: ScriptedStt,
    store: Option<Box<dyn TranscriptStore>>,
) -> AudioWorker {
    AudioWorker::new(
        Box::new(source),
        Box::new(stt),
        Box::new(ConstantTagger::default()),
        store,
        CHUNK_DURATION,
    )
}

#[tokio::test]
async fn test_one_storage_attempt_per_non_empty_chunk() {
    let store = RecordingStore::default();
    let mut worker = worker_with(
        ScriptedSource::new(vec![Ok(silence()), Ok(silence()), Ok(silence())]),
        ScriptedStt::new(&["hello", "", "world"]),
        Some(Box::new(store.clone())),
    );

    for _ in 0..3 {
        worker.tick().await;
    }

    assert_eq!(store.texts(), vec!["hello", "world"]);

    let stats = worker.stats().snapshot();
    assert_eq!(stats.chunks_captured, 3);
    assert_eq!(stats.chunks_transcribed, 2);
    assert_eq!(stats.records_stored, 2);
}

#[tokio::test]
async fn test_whitespace_only_text_skips_storage() {
    let store = RecordingStore::default();
    let mut worker = worker_with(
        ScriptedSource::new(vec![Ok(silence())]),
        ScriptedStt::new(&["   "]),
        Some(Box::new(store.clone())),
    );

    worker.tick().await;

    assert!(store.texts().is_empty());
    assert_eq!(worker.stats().snapshot().chunks_transcribed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_recovers() {
    let store = RecordingStore::default();
    let mut worker = worker_with(
        ScriptedSource::new(vec![Err(anyhow::anyhow!("device unavailable")), Ok(silence())]),
        ScriptedStt::new(&["hello"]),
        Some(Box::new(store.clone())),
    );

    worker.tick().await;
    worker.tick().await;

    let stats = worker.stats().snapshot();
    assert_eq!(stats.capture_failures, 1);
    assert_eq!(stats.chunks_captured, 1);
    assert_eq!(store.texts(), vec!["hello"]);
}

#[tokio::test]
async fn test_storage_failure_does_not_stop_loop() {
    let mut worker = worker_with(
        ScriptedSource::new(vec![Ok(silence()), Ok(silence())]),
        ScriptedStt::new(&["hello", "world"]),
        Some(Box::new(FailingStore)),
    );

    worker.tick().await;
    worker.tick().await;

    let stats = worker.stats().snapshot();
    assert_eq!(stats.store_failures, 2);
    assert_eq!(stats.records_stored, 0);
    assert_eq!(stats.chunks_captured, 2);
}

#[tokio::test]
async fn test_local_mode_never_stores() {
    let mut worker = worker_with(
        ScriptedSource::new(vec![Ok(silence())]),
        ScriptedStt::new(&["hello"]),
        None,
    );

    worker.tick().await;

    let stats = worker.stats().snapshot();
    assert_eq!(stats.records_stored, 0);
    assert_eq!(stats.store_failures, 0);
    assert_eq!(stats.chunks_transcribed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flag_ends_run() {
    let mut worker = worker_with(ScriptedSource::new(vec![]), ScriptedStt::new(&[]), None);
    let shutdown = worker.shutdown_handle();
    let stats = worker.stats();

    let handle = tokio::spawn(async move { worker.run().await });

    // Let a few iterations pass, then cancel.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(stats.snapshot().running);

    shutdown.store(true, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(60), handle)
        .await
        .expect("loop did not stop after shutdown")
        .unwrap();

    assert!(!stats.snapshot().running);
    assert!(stats.snapshot().chunks_captured > 0);
}
