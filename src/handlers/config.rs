//! Configuration handlers
//!
//! Returns the non-secret configuration settings

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::routes::ApiResponse;
use crate::state::AppState;

/// Public configuration response
#[derive(Debug, Serialize)]
pub struct PublicConfig {
    /// Thumbnail bounding box in pixels
    pub photo_size: u32,
    /// Thumbnail size budget in bytes
    pub photo_max_bytes: usize,
    pub freshdesk_domain: String,
    pub freshdesk_enabled: bool,
    pub freshdesk_sync_interval_secs: u64,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<PublicConfig>> {
    let cfg = &state.config;
    Json(ApiResponse::success(PublicConfig {
        photo_size: cfg.photo.size,
        photo_max_bytes: cfg.photo.max_bytes,
        freshdesk_domain: cfg.freshdesk.domain.clone(),
        freshdesk_enabled: cfg.freshdesk.enabled(),
        freshdesk_sync_interval_secs: cfg.freshdesk.sync_interval_secs,
    }))
}
