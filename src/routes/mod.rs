use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::db_layer;
use crate::state::AppState;

pub mod health;

/// Largest accepted photo upload
const PHOTO_UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Config routes
        .route("/config", get(handlers::config::get_config))
        // Department user routes
        .route("/users", get(handlers::department_user::list_users))
        .route("/users/add", post(handlers::department_user::add_user))
        .route("/users/update", post(handlers::department_user::update_user))
        .route("/users/delete", post(handlers::department_user::delete_user))
        .route("/users/:id", get(handlers::department_user::get_user))
        .route("/users/:id/reports", get(handlers::department_user::get_reports))
        .route("/users/:id/pretty/:field", get(handlers::department_user::get_pretty_field))
        .route(
            "/users/:id/photo",
            post(handlers::department_user::upload_photo)
                .layer(DefaultBodyLimit::max(PHOTO_UPLOAD_LIMIT)),
        )
        .route("/users/:id/photo/delete", post(handlers::department_user::delete_photo))
        .route("/users/:id/photo_ad", get(handlers::department_user::get_photo_ad))
        // Organisation routes
        .route("/org_units", get(handlers::organisation::get_org_tree))
        .route("/org_units/add", post(handlers::organisation::add_org_unit))
        .route("/org_units/update", post(handlers::organisation::update_org_unit))
        .route("/org_units/:id/ancestors", get(handlers::organisation::get_ancestors))
        .route("/org_units/:id/descendants", get(handlers::organisation::get_descendants))
        .route("/cost_centres", get(handlers::organisation::list_cost_centres))
        .route("/cost_centres/add", post(handlers::organisation::add_cost_centre))
        .route("/locations", get(handlers::organisation::list_locations))
        .route("/locations/add", post(handlers::organisation::add_location))
        .route("/it_systems", get(handlers::organisation::list_it_systems))
        .route("/it_systems/add", post(handlers::organisation::add_it_system))
        // Device routes
        .route("/computers", get(handlers::device::list_computers))
        .route("/computers/update", post(handlers::device::update_computer))
        .route("/mobiles", get(handlers::device::list_mobiles))
        .route("/ec2_instances", get(handlers::device::list_ec2_instances))
        .route("/devices/:kind/:id/extra_data", get(handlers::device::get_extra_data))
        // Freshdesk routes
        .route("/freshdesk/tickets", get(handlers::freshdesk::list_tickets))
        .route("/freshdesk/tickets/:id", get(handlers::freshdesk::get_ticket))
        .route("/freshdesk/sync", post(handlers::freshdesk::trigger_sync));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), db_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not Found")))
}
