use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::photo::PhotoStore;
use crate::task::SyncScheduler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Application configuration
    pub config: Arc<Config>,
    /// Uploaded photos and thumbnails under `media_root`
    pub photos: PhotoStore,
    /// Freshdesk sync (None when no helpdesk is configured)
    pub sync: Option<Arc<SyncScheduler>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config, sync: Option<Arc<SyncScheduler>>) -> Self {
        let photos = PhotoStore::new(config.media_root.clone());
        Self {
            db,
            config: Arc::new(config),
            photos,
            sync,
        }
    }
}
