//! Health scoring.
//!
//! Maps aggregated metrics onto four fixed checks and one overall score.
//! Pure: no I/O, deterministic for a given snapshot.

use common::models::{
    BackupArtifact, ConnectionMetrics, HealthCheckResult, HealthReport, HealthStatus,
    StorageMetrics,
};

/// Storage usage percentage at which the check turns warning.
pub const STORAGE_WARNING_PCT: f64 = 80.0;
/// Storage usage percentage at which the check turns critical.
pub const STORAGE_CRITICAL_PCT: f64 = 90.0;
/// Connection count at which the check turns warning.
pub const CONNECTIONS_WARNING: u32 = 50;
/// Connection count at which the check turns critical.
pub const CONNECTIONS_CRITICAL: u32 = 100;

/// Overall score at or above which the system is healthy.
const OVERALL_HEALTHY_MIN: u32 = 75;
/// Overall score at or above which the system is only degraded to warning.
const OVERALL_WARNING_MIN: u32 = 50;

/// Evaluates the four fixed health checks.
pub struct HealthScorer;

impl HealthScorer {
    /// Scores a snapshot's metrics into a [`HealthReport`].
    pub fn score(
        storage: &StorageMetrics,
        connections: &ConnectionMetrics,
        latest_backup: Option<&BackupArtifact>,
        test_flagged_total: u64,
    ) -> HealthReport {
        let checks = vec![
            Self::storage_check(storage),
            Self::connections_check(connections),
            Self::backup_check(latest_backup),
            Self::test_data_check(test_flagged_total),
        ];

        let overall_score =
            checks.iter().map(|c| Self::status_score(c.status)).sum::<u32>() / checks.len() as u32;
        let overall_status = if overall_score >= OVERALL_HEALTHY_MIN {
            HealthStatus::Healthy
        } else if overall_score >= OVERALL_WARNING_MIN {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        };

        HealthReport {
            checks,
            overall_score,
            overall_status,
        }
    }

    fn storage_check(storage: &StorageMetrics) -> HealthCheckResult {
        let pct = storage.usage_percentage;
        let status = if pct >= STORAGE_CRITICAL_PCT {
            HealthStatus::Critical
        } else if pct >= STORAGE_WARNING_PCT {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        HealthCheckResult {
            check: "storage".to_string(),
            status,
            message: format!(
                "Storage usage at {:.2}% of {} MiB limit",
                pct,
                storage.limit_bytes / (1024 * 1024)
            ),
        }
    }

    fn connections_check(connections: &ConnectionMetrics) -> HealthCheckResult {
        let current = connections.current_connections;
        let status = if current >= CONNECTIONS_CRITICAL {
            HealthStatus::Critical
        } else if current >= CONNECTIONS_WARNING {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        HealthCheckResult {
            check: "connections".to_string(),
            status,
            message: format!(
                "{} of {} allowed connections open",
                current, connections.connection_limit
            ),
        }
    }

    // Binary check: never reports critical.
    fn backup_check(latest: Option<&BackupArtifact>) -> HealthCheckResult {
        let (status, message) = match latest {
            Some(artifact) => (
                HealthStatus::Healthy,
                format!("Latest backup: {}", artifact.file_name),
            ),
            None => (
                HealthStatus::Warning,
                "No backup artifacts found".to_string(),
            ),
        };
        HealthCheckResult {
            check: "backup".to_string(),
            status,
            message,
        }
    }

    // Binary check: never reports critical.
    fn test_data_check(test_flagged_total: u64) -> HealthCheckResult {
        let (status, message) = if test_flagged_total == 0 {
            (HealthStatus::Healthy, "No test records present".to_string())
        } else {
            (
                HealthStatus::Warning,
                format!("{} test records present", test_flagged_total),
            )
        };
        HealthCheckResult {
            check: "test_data".to_string(),
            status,
            message,
        }
    }

    fn status_score(status: HealthStatus) -> u32 {
        match status {
            HealthStatus::Healthy => 100,
            HealthStatus::Warning => 50,
            HealthStatus::Critical => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const MIB: u64 = 1024 * 1024;

    fn storage_with_pct(pct: f64) -> StorageMetrics {
        let limit = 512 * MIB;
        let used = (limit as f64 * pct / 100.0) as u64;
        StorageMetrics::new(used, 0, 8, 100, limit)
    }

    fn connections_with(current: u32) -> ConnectionMetrics {
        ConnectionMetrics {
            current_connections: current,
            min_pool_size: 2,
            max_pool_size: 10,
            connection_limit: 500,
        }
    }

    fn artifact() -> BackupArtifact {
        BackupArtifact {
            file_name: "backup-2026-08-27.json".to_string(),
            created_at: Utc::now(),
            size_bytes: 1024,
            is_directory: false,
        }
    }

    #[test]
    fn test_storage_thresholds() {
        let cases = [
            (0.0, HealthStatus::Healthy),
            (79.99, HealthStatus::Healthy),
            (80.0, HealthStatus::Warning),
            (89.99, HealthStatus::Warning),
            (90.0, HealthStatus::Critical),
            (120.0, HealthStatus::Critical),
        ];
        for (pct, expected) in cases {
            let check = HealthScorer::storage_check(&storage_with_pct(pct));
            assert_eq!(check.status, expected, "usage {}%", pct);
        }
    }

    #[test]
    fn test_connections_thresholds() {
        let cases = [
            (0, HealthStatus::Healthy),
            (49, HealthStatus::Healthy),
            (50, HealthStatus::Warning),
            (99, HealthStatus::Warning),
            (100, HealthStatus::Critical),
        ];
        for (current, expected) in cases {
            let check = HealthScorer::connections_check(&connections_with(current));
            assert_eq!(check.status, expected, "{} connections", current);
        }
    }

    #[test]
    fn test_backup_and_test_data_never_critical() {
        assert_eq!(
            HealthScorer::backup_check(None).status,
            HealthStatus::Warning
        );
        assert_eq!(
            HealthScorer::backup_check(Some(&artifact())).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthScorer::test_data_check(9999).status,
            HealthStatus::Warning
        );
        assert_eq!(
            HealthScorer::test_data_check(0).status,
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_overall_score_floors_the_mean() {
        // healthy, healthy, healthy, warning -> floor(350 / 4) = 87
        let report = HealthScorer::score(
            &storage_with_pct(10.0),
            &connections_with(5),
            Some(&artifact()),
            3,
        );
        assert_eq!(report.overall_score, 87);
        assert_eq!(report.overall_status, HealthStatus::Healthy);
    }

    #[test]
    fn test_overall_status_boundaries() {
        // Two warnings -> (100 + 100 + 50 + 50) / 4 = 75, still healthy.
        let report = HealthScorer::score(&storage_with_pct(85.0), &connections_with(5), None, 0);
        assert_eq!(report.overall_score, 75);
        assert_eq!(report.overall_status, HealthStatus::Healthy);

        // Critical storage and connections drag the overall to critical.
        let report = HealthScorer::score(&storage_with_pct(95.0), &connections_with(150), None, 1);
        assert_eq!(report.overall_score, 25);
        assert_eq!(report.overall_status, HealthStatus::Critical);
    }

    #[test]
    fn test_all_healthy_scores_hundred() {
        let report = HealthScorer::score(
            &storage_with_pct(23.44),
            &connections_with(8),
            Some(&artifact()),
            0,
        );
        assert_eq!(report.overall_score, 100);
        assert_eq!(report.overall_status, HealthStatus::Healthy);
        assert_eq!(report.checks.len(), 4);
    }
}
