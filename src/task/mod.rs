//! Background jobs
//!
//! Currently only the periodic Freshdesk helpdesk sync

mod scheduler;

pub use scheduler::SyncScheduler;
