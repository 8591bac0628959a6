//! Data-store seam for the admin service.
//!
//! The [`DataStore`] trait is the only thing the aggregation, cleanup and
//! backup code knows about the database; [`MongoStore`] is the production
//! implementation. Tests substitute their own.

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};

use common::errors::{AppError, AppResult};
use common::models::{HourLogCounts, MemberCounts, RecordCounts, TaskCounts, TestRecordCounts};

/// Regular member roster collection.
pub const COLL_USERS: &str = "users";
/// Privileged-role member collection (counted into the member total).
pub const COLL_HIGHBOARD: &str = "highboard";
/// Chapter tasks collection.
pub const COLL_TASKS: &str = "tasks";
/// Hour-log collection.
pub const COLL_HOUR_LOGS: &str = "hourlogs";

/// Collections covered by counts, cleanup and the structural export.
pub const TRACKED_COLLECTIONS: [&str; 4] =
    [COLL_USERS, COLL_HIGHBOARD, COLL_TASKS, COLL_HOUR_LOGS];

/// Boolean attribute marking demo/seed records.
pub const FIELD_IS_TEST: &str = "isTest";
/// Status attribute on tasks and hour logs.
pub const FIELD_STATUS: &str = "status";

pub const TASK_STATUS_OPEN: &str = "open";
pub const TASK_STATUS_COMPLETED: &str = "completed";
pub const HOUR_STATUS_PENDING: &str = "pending";
pub const HOUR_STATUS_APPROVED: &str = "approved";

/// Raw engine-level storage statistics (`dbStats`).
#[derive(Debug, Clone, Default)]
pub struct EngineStorageStats {
    pub data_size_bytes: u64,
    pub index_size_bytes: u64,
    pub collection_count: u32,
    pub document_count: u64,
}

/// Full dump of one collection for the structural JSON export.
#[derive(Debug, Clone)]
pub struct CollectionDump {
    pub name: String,
    pub count: u64,
    pub documents: Vec<serde_json::Value>,
}

/// Everything the admin service needs from the database.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Engine-level storage statistics.
    async fn storage_stats(&self) -> AppResult<EngineStorageStats>;

    /// Number of currently open connections on the server.
    async fn current_connections(&self) -> AppResult<u32>;

    /// Production record counts with status breakdowns, plus test-flagged
    /// counts, per entity kind.
    async fn record_counts(&self) -> AppResult<RecordCounts>;

    /// Test-flagged record counts per kind.
    async fn test_record_counts(&self) -> AppResult<TestRecordCounts>;

    /// Deletes all test-flagged records; returns per-kind deleted counts.
    ///
    /// Deletions run concurrently with no transaction across kinds, so a
    /// failure can leave a mixed state.
    async fn delete_test_records(&self) -> AppResult<TestRecordCounts>;

    /// Reads every record of every tracked collection.
    async fn export_all(&self) -> AppResult<Vec<CollectionDump>>;
}

/// MongoDB-backed [`DataStore`].
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Creates a store over an already-connected client.
    pub fn new(client: Client, database_name: &str) -> Self {
        let db = client.database(database_name);
        Self { client, db }
    }

    async fn count(&self, collection: &str, filter: Document) -> AppResult<u64> {
        let count = self
            .db
            .collection::<Document>(collection)
            .count_documents(filter)
            .await
            .map_err(|e| AppError::Database(format!("count on {} failed: {}", collection, e)))?;
        Ok(count)
    }

    async fn delete_flagged(&self, collection: &str) -> AppResult<u64> {
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_many(test_filter())
            .await
            .map_err(|e| AppError::Database(format!("delete on {} failed: {}", collection, e)))?;
        Ok(result.deleted_count)
    }
}

/// Filter matching production records (flag absent or false).
fn production_filter() -> Document {
    doc! { FIELD_IS_TEST: { "$ne": true } }
}

/// Filter matching test-flagged records.
fn test_filter() -> Document {
    doc! { FIELD_IS_TEST: true }
}

fn with_status(mut filter: Document, status: &str) -> Document {
    filter.insert(FIELD_STATUS, status);
    filter
}

/// Reads a numeric field that the engine may report as int32, int64 or double.
fn numeric(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

#[async_trait]
impl DataStore for MongoStore {
    async fn storage_stats(&self) -> AppResult<EngineStorageStats> {
        let stats = self
            .db
            .run_command(doc! { "dbStats": 1 })
            .await
            .map_err(|e| AppError::Database(format!("dbStats failed: {}", e)))?;

        Ok(EngineStorageStats {
            data_size_bytes: numeric(&stats, "dataSize") as u64,
            index_size_bytes: numeric(&stats, "indexSize") as u64,
            collection_count: numeric(&stats, "collections") as u32,
            document_count: numeric(&stats, "objects") as u64,
        })
    }

    async fn current_connections(&self) -> AppResult<u32> {
        let status = self
            .client
            .database("admin")
            .run_command(doc! { "serverStatus": 1 })
            .await
            .map_err(|e| AppError::Database(format!("serverStatus failed: {}", e)))?;

        let connections = status
            .get_document("connections")
            .map_err(|e| AppError::Database(format!("serverStatus missing connections: {}", e)))?;
        Ok(numeric(connections, "current") as u32)
    }

    async fn record_counts(&self) -> AppResult<RecordCounts> {
        let (
            regular,
            highboard,
            users_test,
            highboard_test,
            tasks_total,
            tasks_open,
            tasks_completed,
            tasks_test,
            logs_total,
            logs_pending,
            logs_approved,
            logs_test,
        ) = tokio::try_join!(
            self.count(COLL_USERS, production_filter()),
            self.count(COLL_HIGHBOARD, production_filter()),
            self.count(COLL_USERS, test_filter()),
            self.count(COLL_HIGHBOARD, test_filter()),
            self.count(COLL_TASKS, production_filter()),
            self.count(COLL_TASKS, with_status(production_filter(), TASK_STATUS_OPEN)),
            self.count(COLL_TASKS, with_status(production_filter(), TASK_STATUS_COMPLETED)),
            self.count(COLL_TASKS, test_filter()),
            self.count(COLL_HOUR_LOGS, production_filter()),
            self.count(COLL_HOUR_LOGS, with_status(production_filter(), HOUR_STATUS_PENDING)),
            self.count(COLL_HOUR_LOGS, with_status(production_filter(), HOUR_STATUS_APPROVED)),
            self.count(COLL_HOUR_LOGS, test_filter()),
        )?;

        Ok(RecordCounts {
            members: MemberCounts {
                total: regular + highboard,
                regular,
                highboard,
                test_flagged: users_test + highboard_test,
            },
            tasks: TaskCounts {
                total: tasks_total,
                open: tasks_open,
                completed: tasks_completed,
                test_flagged: tasks_test,
            },
            hour_logs: HourLogCounts {
                total: logs_total,
                pending: logs_pending,
                approved: logs_approved,
                test_flagged: logs_test,
            },
        })
    }

    async fn test_record_counts(&self) -> AppResult<TestRecordCounts> {
        let (users, highboard, tasks, hour_logs) = tokio::try_join!(
            self.count(COLL_USERS, test_filter()),
            self.count(COLL_HIGHBOARD, test_filter()),
            self.count(COLL_TASKS, test_filter()),
            self.count(COLL_HOUR_LOGS, test_filter()),
        )?;

        Ok(TestRecordCounts {
            members: users + highboard,
            tasks,
            hour_logs,
        })
    }

    async fn delete_test_records(&self) -> AppResult<TestRecordCounts> {
        let (users, highboard, tasks, hour_logs) = tokio::try_join!(
            self.delete_flagged(COLL_USERS),
            self.delete_flagged(COLL_HIGHBOARD),
            self.delete_flagged(COLL_TASKS),
            self.delete_flagged(COLL_HOUR_LOGS),
        )?;

        tracing::info!(
            members = users + highboard,
            tasks,
            hour_logs,
            "test records deleted"
        );
        Ok(TestRecordCounts {
            members: users + highboard,
            tasks,
            hour_logs,
        })
    }

    async fn export_all(&self) -> AppResult<Vec<CollectionDump>> {
        let mut dumps = Vec::with_capacity(TRACKED_COLLECTIONS.len());
        for name in TRACKED_COLLECTIONS {
            let mut cursor = self
                .db
                .collection::<Document>(name)
                .find(doc! {})
                .await
                .map_err(|e| AppError::Database(format!("find on {} failed: {}", name, e)))?;

            let mut documents = Vec::new();
            while cursor
                .advance()
                .await
                .map_err(|e| AppError::Database(format!("cursor on {} failed: {}", name, e)))?
            {
                let doc = cursor
                    .deserialize_current()
                    .map_err(|e| AppError::Database(format!("decode on {} failed: {}", name, e)))?;
                documents.push(Bson::Document(doc).into_relaxed_extjson());
            }

            dumps.push(CollectionDump {
                name: name.to_string(),
                count: documents.len() as u64,
                documents,
            });
        }
        Ok(dumps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coerces_engine_number_types() {
        let doc = doc! { "a": 1i32, "b": 2i64, "c": 3.5f64, "d": "nope" };
        assert_eq!(numeric(&doc, "a"), 1.0);
        assert_eq!(numeric(&doc, "b"), 2.0);
        assert_eq!(numeric(&doc, "c"), 3.5);
        assert_eq!(numeric(&doc, "d"), 0.0);
        assert_eq!(numeric(&doc, "missing"), 0.0);
    }

    #[test]
    fn test_status_filter_keeps_production_clause() {
        let filter = with_status(production_filter(), TASK_STATUS_OPEN);
        assert_eq!(filter.get_str(FIELD_STATUS).unwrap(), TASK_STATUS_OPEN);
        assert!(filter.contains_key(FIELD_IS_TEST));
    }
}
