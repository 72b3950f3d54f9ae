use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use hey_listen::audio::MicSource;
use hey_listen::config::Config;
use hey_listen::http::{create_router, AppState};
use hey_listen::speaker::ConstantTagger;
use hey_listen::store::{BoundedStore, HttpEmbedder, QdrantIndex, TranscriptStore};
use hey_listen::transcribe::WhisperTranscriber;
use hey_listen::worker::AudioWorker;

#[derive(Parser, Debug)]
#[command(
    name = "hey-listen",
    about = "Continuous audio transcription worker with bounded vector storage"
)]
struct Args {
    /// Path to a configuration file (extension optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;

    if args.print_config {
        println!("{:#?}", cfg);
        return Ok(());
    }

    info!("hey-listen v{}", env!("CARGO_PKG_VERSION"));
    info!("Whisper model: {}", cfg.transcription.model);
    info!("Chunk duration: {}s", cfg.audio.chunk_duration_secs);
    info!("Sample rate: {}Hz", cfg.audio.sample_rate);
    info!(
        "Storage configured: {}",
        if cfg.storage.is_some() { "yes" } else { "no" }
    );

    let store: Option<Box<dyn TranscriptStore>> = match &cfg.storage {
        Some(storage_cfg) => {
            let index = QdrantIndex::connect(storage_cfg).await?;
            let embedder = HttpEmbedder::new(&storage_cfg.embedding);
            Some(Box::new(BoundedStore::new(
                Box::new(index),
                Box::new(embedder),
                storage_cfg.max_records,
            )))
        }
        None => {
            warn!("No storage configured, running in local mode (transcriptions are logged only)");
            None
        }
    };

    let transcriber = WhisperTranscriber::new(&cfg.transcription)?;
    let source = MicSource::new(cfg.audio.sample_rate)?;

    let mut worker = AudioWorker::new(
        Box::new(source),
        Box::new(transcriber),
        Box::new(ConstantTagger::default()),
        store,
        Duration::from_secs(cfg.audio.chunk_duration_secs),
    );

    // Liveness/status HTTP surface
    let state = AppState::new(worker.stats(), cfg.storage.is_some());
    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Ctrl-C ends the loop at the next iteration boundary
    let shutdown = worker.shutdown_handle();
    let shutdown_flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown_flag.store(true, Ordering::SeqCst);
        }
    });

    info!("Listening... press Ctrl+C to stop");
    worker.run().await;

    info!("Shutting down");
    Ok(())
}
