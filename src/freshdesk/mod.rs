//! Freshdesk helpdesk cache: API client, ticket matching rules and the sync job

pub mod client;
pub mod model;
pub mod sync;

pub use client::{FreshdeskClient, HelpdeskApi};
pub use sync::{run_sync, SyncReport};
