//! Resilience primitives.
//!
//! Only read-side polling is retried (verification status, explorer
//! indexing). Deployment transactions are submitted exactly once.

pub mod backoff;

pub use backoff::{calculate_backoff, Backoff};
