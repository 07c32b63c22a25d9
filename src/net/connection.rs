//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Track connection state (Accepted → ReadingRequest → Fetching →
//!   Rewriting → Responding → Closed)
//! - Generate unique connection IDs for tracing
//! - Count live connections so shutdown can drain them

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Global atomic counter for connection IDs.
/// Relaxed ordering suffices; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Stage of a single proxied connection.
///
/// Stages only move forward. Every connection ends in `Closed`, so a failed
/// fetch skips the stages in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    Accepted,
    ReadingRequest,
    Fetching,
    Rewriting,
    Responding,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accepted => "accepted",
            Self::ReadingRequest => "reading_request",
            Self::Fetching => "fetching",
            Self::Rewriting => "rewriting",
            Self::Responding => "responding",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct TrackerInner {
    active_count: AtomicU64,
    drained: Notify,
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. Returns a guard that untracks it on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.inner.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            tracker: Arc::clone(&self.inner),
            id: ConnectionId::new(),
            state: ConnectionState::Accepted,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.inner.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has been dropped.
    pub async fn wait_for_drain(&self) {
        loop {
            // Registered before the check so a concurrent last drop is not missed.
            let drained = self.inner.drained.notified();
            if self.active_count() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// Guard that tracks a connection's lifetime and stage.
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<TrackerInner>,
    id: ConnectionId,
    state: ConnectionState,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Current stage.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`. Backward transitions are ignored.
    pub fn advance(&mut self, next: ConnectionState) {
        if next <= self.state {
            tracing::warn!(
                connection_id = %self.id,
                from = %self.state,
                to = %next,
                "Ignoring backward state transition"
            );
            return;
        }
        tracing::debug!(connection_id = %self.id, from = %self.state, to = %next, "State transition");
        self.state = next;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.tracker.active_count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.drained.notify_waiters();
        }
        tracing::trace!(connection_id = %self.id, last_state = %self.state, "Connection closed");
    }
}
