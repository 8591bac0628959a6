//! System stats aggregation.
//!
//! One aggregator call produces one [`SystemStatsSnapshot`]: storage,
//! connections and record counts are fetched concurrently, joined, and
//! scored. Any failing read aborts the whole snapshot; a partial snapshot
//! is never returned.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{ConnectionMetrics, LatestBackup, StorageMetrics, SystemStatsSnapshot};

use crate::backup::BackupStore;
use crate::health::HealthScorer;
use crate::store::DataStore;

/// Storage quota granted by the database provider (free tier).
pub const STORAGE_LIMIT_BYTES: u64 = 512 * 1024 * 1024;

/// Builds stats snapshots from the data store and the backup directory.
pub struct StatsAggregator {
    store: Arc<dyn DataStore>,
    backup: Arc<BackupStore>,
    config: AppConfig,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn DataStore>, backup: Arc<BackupStore>, config: AppConfig) -> Self {
        Self {
            store,
            backup,
            config,
        }
    }

    /// Computes a full snapshot, all-or-nothing.
    pub async fn compute_stats(&self) -> AppResult<SystemStatsSnapshot> {
        let (engine, current_connections, records) = tokio::try_join!(
            self.store.storage_stats(),
            self.store.current_connections(),
            self.store.record_counts(),
        )
        .map_err(|e| AppError::Aggregation(e.to_string()))?;

        let latest = self
            .backup
            .latest()
            .await
            .map_err(|e| AppError::Aggregation(e.to_string()))?;

        let storage = StorageMetrics::new(
            engine.data_size_bytes,
            engine.index_size_bytes,
            engine.collection_count,
            engine.document_count,
            STORAGE_LIMIT_BYTES,
        );
        let connections = ConnectionMetrics {
            current_connections,
            min_pool_size: self.config.min_pool_size,
            max_pool_size: self.config.max_pool_size,
            connection_limit: self.config.connection_limit,
        };

        let health = HealthScorer::score(
            &storage,
            &connections,
            latest.as_ref(),
            records.test_flagged_total(),
        );

        let latest_backup = latest.map(|artifact| LatestBackup {
            age: BackupStore::age(&artifact),
            file_name: artifact.file_name,
            created_at: artifact.created_at,
            size_bytes: artifact.size_bytes,
            is_directory: artifact.is_directory,
        });

        Ok(SystemStatsSnapshot {
            storage,
            connections,
            records,
            latest_backup,
            health,
        })
    }
}
