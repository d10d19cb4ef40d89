//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / Ctrl-C → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → long waits (confirmation, verification polling) abort
//! ```
//!
//! # Design Decisions
//! - Cancellation is explicit: waits take a receiver, nothing is global
//! - A cancelled wait does not un-send a transaction; it only stops waiting

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
