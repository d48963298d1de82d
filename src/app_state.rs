use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    infrastructure::{DocumentStore, SqliteDocumentStore},
    ranking::{FileSnapshot, SnapshotSource},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub snapshot: Arc<dyn SnapshotSource>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        ensure_database_dir(&config.database.url)?;
        let store = SqliteDocumentStore::connect(&config.database.url).await?;
        store.health_check().await?;
        info!("Document store ready at {}", config.database.url);

        let snapshot = FileSnapshot::new(&config.site.dataset_path);

        Ok(Self::with_parts(config, Arc::new(store), Arc::new(snapshot)))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        snapshot: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            config,
            store,
            snapshot,
        }
    }
}

/// Create the parent directory of a file-backed SQLite url
pub fn ensure_database_dir(url: &str) -> std::io::Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
