//! Content repository wiring - picks the store backing the repository.

use std::sync::Arc;

use quill_core::ContentRepository;
use quill_core::ports::ContentStore;

use crate::database::{DatabaseConfig, InMemoryContentStore};

#[cfg(feature = "postgres")]
use crate::database::{PostgresContentStore, connect};

/// Build a content repository over PostgreSQL when configured and
/// reachable, otherwise over an empty in-memory store.
pub async fn build_repository(db_config: Option<&DatabaseConfig>) -> ContentRepository {
    ContentRepository::new(open_store(db_config).await)
}

#[cfg(feature = "postgres")]
async fn open_store(db_config: Option<&DatabaseConfig>) -> Arc<dyn ContentStore> {
    let Some(config) = db_config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Arc::new(InMemoryContentStore::new());
    };

    match connect(config).await {
        Ok(conn) => Arc::new(PostgresContentStore::new(conn)),
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            Arc::new(InMemoryContentStore::new())
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(_db_config: Option<&DatabaseConfig>) -> Arc<dyn ContentStore> {
    tracing::info!("Running without postgres feature - using in-memory store");
    Arc::new(InMemoryContentStore::new())
}
