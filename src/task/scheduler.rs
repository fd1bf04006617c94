//! Periodic Freshdesk sync
//!
//! Each run asks for tickets updated since the previous successful run started.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, AppResult};
use crate::freshdesk::{run_sync, HelpdeskApi, SyncReport};

pub struct SyncScheduler {
    db: DatabaseConnection,
    api: Arc<dyn HelpdeskApi>,
    /// Start time of the last successful run; held for the whole of a run
    last_start: Mutex<Option<DateTime<Utc>>>,
}

impl SyncScheduler {
    pub fn new(db: DatabaseConnection, api: Arc<dyn HelpdeskApi>) -> Self {
        Self {
            db,
            api,
            last_start: Mutex::new(None),
        }
    }

    /// Start time of the last successful run
    pub async fn last_start(&self) -> Option<DateTime<Utc>> {
        *self.last_start.lock().await
    }

    /// Run one sync now. Fails with `Conflict` while another run is in progress.
    pub async fn run_once(&self) -> AppResult<SyncReport> {
        let Ok(mut last_start) = self.last_start.try_lock() else {
            return Err(AppError::Conflict(
                "A Freshdesk sync is already running".to_string(),
            ));
        };

        let started = Utc::now();
        tracing::info!("Freshdesk sync started (updated since {:?})", *last_start);
        let report = run_sync(&self.db, self.api.as_ref(), *last_start).await?;
        *last_start = Some(started);
        Ok(report)
    }

    /// Run forever on a fixed interval; the first run starts immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(report) => tracing::info!("Freshdesk sync finished: {:?}", report),
                    Err(AppError::Conflict(_)) => {
                        tracing::debug!("Skipping scheduled Freshdesk sync, one is already running")
                    }
                    Err(e) => tracing::error!("Freshdesk sync failed: {}", e),
                }
            }
        })
    }
}
