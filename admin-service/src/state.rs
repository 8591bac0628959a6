//! Application state for the admin service.

use std::sync::Arc;
use std::time::Duration;

use mongodb::options::ClientOptions;
use mongodb::Client;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};

use crate::backup::BackupStore;
use crate::service::{AdminPolicy, RolePolicy};
use crate::store::{DataStore, MongoStore};

/// Application state shared across handlers.
///
/// The database client is created once at process start and reused for the
/// lifetime of the process; the driver reconnects dropped pooled
/// connections on its own.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DataStore>,
    pub backup: Arc<BackupStore>,
    pub policy: Arc<dyn AdminPolicy>,
}

impl AppState {
    /// Creates the production state: MongoDB-backed store, default policy.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.database_url)
            .await
            .map_err(|e| AppError::Config(format!("invalid MONGODB_URI: {}", e)))?;
        options.app_name = Some(config.service_name.clone());
        options.min_pool_size = Some(config.min_pool_size);
        options.max_pool_size = Some(config.max_pool_size);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        let client = Client::with_options(options)
            .map_err(|e| AppError::Config(format!("cannot build database client: {}", e)))?;
        let store: Arc<dyn DataStore> = Arc::new(MongoStore::new(client, &config.database_name));

        Ok(Self::with_parts(config, store, Arc::new(RolePolicy::default())))
    }

    /// Assembles state from explicit parts; tests inject their own store
    /// and policy here.
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn DataStore>,
        policy: Arc<dyn AdminPolicy>,
    ) -> Self {
        let backup = Arc::new(BackupStore::new(
            config.backup_dir.clone(),
            config.database_url.clone(),
            config.database_name.clone(),
            store.clone(),
        ));
        Self {
            config,
            store,
            backup,
            policy,
        }
    }
}
