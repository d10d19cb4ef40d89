//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events with structured fields
//!     → logging.rs (fmt or JSON subscriber, stderr)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so stdout carries only the deployment result
//! - `RUST_LOG` overrides the configured level
//! - Secrets are never passed as fields

pub mod logging;

pub use logging::init_logging;
