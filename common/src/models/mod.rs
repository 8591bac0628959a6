//! Shared data models for all services.

pub mod admin;
pub mod principal;

// Re-export commonly used types
pub use admin::{
    BackupArtifact, ConnectionMetrics, HealthCheckResult, HealthReport, HealthStatus,
    HourLogCounts, LatestBackup, MemberCounts, RecordCounts, StorageMetrics,
    SystemStatsSnapshot, TaskCounts, TestRecordCounts,
};
pub use principal::Principal;
