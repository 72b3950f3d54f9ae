use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId,
    PointStruct, PointsIdsList, ScrollPointsBuilder, UpsertPointsBuilder, Value,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::info;

use crate::config::StorageConfig;

/// A record as sent to the index.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    /// UUID string
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// Candidate returned by an oldest-record scan.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionCandidate {
    pub id: String,
    pub timestamp: f64,
}

/// The external vector index surface the bounded store drives.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Exact total record count.
    async fn count(&self) -> Result<u64>;

    /// The record with the smallest `(timestamp, id)`, if any.
    async fn oldest(&self) -> Result<Option<EvictionCandidate>>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn insert(&self, point: IndexPoint) -> Result<()>;
}

/// Qdrant-backed index. The collection is created with the configured
/// dimension and Cosine distance when it does not exist yet.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
    /// Upper bound on the oldest-record scan; covers the whole collection
    /// while the capacity invariant holds.
    scan_limit: u32,
}

impl QdrantIndex {
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        info!("Connecting to vector index at {}", config.url);

        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().context("Failed to create Qdrant client")?;

        client
            .health_check()
            .await
            .context("Vector index health check failed")?;

        let index = Self {
            client,
            collection: config.collection.clone(),
            dimension: config.embedding.dimension,
            scan_limit: config.max_records.max(1) as u32 + 1,
        };
        index.ensure_collection().await?;

        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_info(&self.collection).await.is_ok() {
            info!("Collection '{}' already exists", self.collection);
            return Ok(());
        }

        info!(
            "Creating collection '{}' ({}-dim, Cosine)",
            self.collection, self.dimension
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await
            .context("Failed to create collection")?;

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .context("Count query failed")?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn oldest(&self) -> Result<Option<EvictionCandidate>> {
        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(&self.collection)
                    .limit(self.scan_limit)
                    .with_payload(true),
            )
            .await
            .context("Oldest-record scan failed")?;

        let mut oldest: Option<EvictionCandidate> = None;
        for point in response.result {
            let Some(id) = point.id.and_then(point_id_string) else {
                continue;
            };
            let timestamp = point
                .payload
                .get("timestamp")
                .and_then(value_as_f64)
                .unwrap_or(f64::MAX);

            let candidate = EvictionCandidate { id, timestamp };
            let replace = match &oldest {
                None => true,
                Some(current) => {
                    (candidate.timestamp, candidate.id.as_str())
                        < (current.timestamp, current.id.as_str())
                }
            };
            if replace {
                oldest = Some(candidate);
            }
        }

        Ok(oldest)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![parse_point_id(id)],
                    })
                    .wait(true),
            )
            .await
            .context("Delete failed")?;

        Ok(())
    }

    async fn insert(&self, point: IndexPoint) -> Result<()> {
        let payload = Payload::try_from(point.payload)
            .map_err(|e| anyhow!("Payload conversion failed: {}", e))?;
        let qdrant_point = PointStruct::new(point.id, point.vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![qdrant_point]).wait(true))
            .await
            .context("Upsert failed")?;

        Ok(())
    }
}

fn point_id_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(uuid) => Some(uuid),
    }
}

fn parse_point_id(id: &str) -> PointId {
    match id.parse::<u64>() {
        Ok(n) => PointId::from(n),
        Err(_) => PointId::from(id.to_string()),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value.kind.as_ref()? {
        Kind::DoubleValue(v) => Some(*v),
        Kind::IntegerValue(v) => Some(*v as f64),
        _ => None,
    }
}
