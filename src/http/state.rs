use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::worker::PipelineStats;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<PipelineStats>,
    pub started_at: DateTime<Utc>,
    pub storage_enabled: bool,
}

impl AppState {
    pub fn new(stats: Arc<PipelineStats>, storage_enabled: bool) -> Self {
        Self {
            stats,
            started_at: Utc::now(),
            storage_enabled,
        }
    }
}
