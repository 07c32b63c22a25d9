//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → per-connection spans (connection_id, peer_addr)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stdout)
//! ```

pub mod logging;
