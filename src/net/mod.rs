//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (reusable socket, accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, state machine)
//!     → Hand off to the HTTP layer
//!
//! Connection States:
//!     Accepted → ReadingRequest → Fetching → Rewriting → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept via semaphore prevents resource exhaustion
//! - Each connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{create_reusable_listener, ConnectionPermit, Listener, ListenerError};
