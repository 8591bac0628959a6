//! Admin monitoring and backup models.
//!
//! Everything here is ephemeral: snapshots are recomputed on every request
//! and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Storage statistics reported by the database engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StorageMetrics {
    /// Bytes used by document data.
    pub data_size_bytes: u64,
    /// Bytes used by indexes.
    pub index_size_bytes: u64,
    /// Number of collections.
    pub collection_count: u32,
    /// Total number of documents.
    pub document_count: u64,
    /// Configured storage limit in bytes.
    pub limit_bytes: u64,
    /// (data + index) / limit × 100, rounded to 2 decimals.
    /// Not clamped: can exceed 100 when over the limit.
    pub usage_percentage: f64,
}

impl StorageMetrics {
    /// Builds storage metrics, deriving the usage percentage.
    pub fn new(
        data_size_bytes: u64,
        index_size_bytes: u64,
        collection_count: u32,
        document_count: u64,
        limit_bytes: u64,
    ) -> Self {
        let used = (data_size_bytes + index_size_bytes) as f64;
        let raw = used / limit_bytes as f64 * 100.0;
        Self {
            data_size_bytes,
            index_size_bytes,
            collection_count,
            document_count,
            limit_bytes,
            usage_percentage: (raw * 100.0).round() / 100.0,
        }
    }
}

/// Live connection usage, computed per request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionMetrics {
    /// Currently open pooled connections.
    pub current_connections: u32,
    /// Configured minimum pool size (reported, not measured).
    pub min_pool_size: u32,
    /// Configured maximum pool size (reported, not measured).
    pub max_pool_size: u32,
    /// External connection quota granted by the provider.
    pub connection_limit: u32,
}

/// Member roster counts. Regular and highboard members live in separate
/// collections; `total` sums the production records of both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MemberCounts {
    pub total: u64,
    pub regular: u64,
    pub highboard: u64,
    pub test_flagged: u64,
}

/// Task counts with status breakdown (production records only).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskCounts {
    pub total: u64,
    pub open: u64,
    pub completed: u64,
    pub test_flagged: u64,
}

/// Hour-log counts with status breakdown (production records only).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HourLogCounts {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub test_flagged: u64,
}

/// Per-kind record counts for one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RecordCounts {
    pub members: MemberCounts,
    pub tasks: TaskCounts,
    pub hour_logs: HourLogCounts,
}

impl RecordCounts {
    /// Test-flagged records across all kinds.
    pub fn test_flagged_total(&self) -> u64 {
        self.members.test_flagged + self.tasks.test_flagged + self.hour_logs.test_flagged
    }
}

/// Test-flagged record counts per kind, used by the cleanup report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TestRecordCounts {
    pub members: u64,
    pub tasks: u64,
    pub hour_logs: u64,
}

impl TestRecordCounts {
    /// Sum across all kinds.
    pub fn total(&self) -> u64 {
        self.members + self.tasks + self.hour_logs
    }
}

/// One entry in the backup directory: either a native dump directory or a
/// JSON export file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupArtifact {
    /// File or directory name inside the backup directory.
    pub file_name: String,
    /// Modification time.
    pub created_at: DateTime<Utc>,
    /// Size in bytes (directory entry size for dump directories).
    pub size_bytes: u64,
    /// Whether the artifact is a native dump directory.
    pub is_directory: bool,
}

/// Latest backup info embedded in a stats snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LatestBackup {
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    /// Human-readable age, e.g. "1d 1h ago".
    pub age: String,
    pub size_bytes: u64,
    pub is_directory: bool,
}

/// Three-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Result of a single health check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthCheckResult {
    /// Check name ("storage", "connections", "backup", "test_data").
    pub check: String,
    pub status: HealthStatus,
    /// Human-readable summary.
    pub message: String,
}

/// Combined health report for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub checks: Vec<HealthCheckResult>,
    /// 0–100, floor of the mean of the per-check scores.
    pub overall_score: u32,
    pub overall_status: HealthStatus,
}

/// Full system stats snapshot returned by the admin stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SystemStatsSnapshot {
    pub storage: StorageMetrics,
    pub connections: ConnectionMetrics,
    pub records: RecordCounts,
    /// Most recent backup artifact, if any exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_backup: Option<LatestBackup>,
    pub health: HealthReport,
}
