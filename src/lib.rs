//! IT Assets - department staff, organisation and IT asset register
//!
//! This crate keeps the department's people, organisational structure and
//! managed devices in one database, derives the denormalised org data and
//! directory photo thumbnails on save, and caches Freshdesk helpdesk tickets.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod freshdesk;
pub mod handlers;
pub mod middleware;
pub mod org;
pub mod photo;
pub mod pretty;
pub mod routes;
pub mod state;
pub mod task;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
