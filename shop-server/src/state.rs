//! Application state for shop-server

use std::sync::Arc;

use crate::BoxError;
use crate::config::{Config, StorageBackend};
use crate::db::{MemoryStore, PgStore, Store};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Transactional store every operation runs against
    pub store: Arc<dyn Store>,
    /// Environment name reported by the health endpoint
    pub environment: String,
}

impl AppState {
    /// Connect the configured backend (running migrations for postgres)
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set")?;
                let store = PgStore::connect(url, config.db_max_connections).await?;
                tracing::info!(max_connections = config.db_max_connections, "PostgreSQL store ready");
                Arc::new(store)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on exit");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self {
            store,
            environment: config.environment.clone(),
        })
    }

    /// State over an existing store (tests, embedding)
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            environment: "development".into(),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
