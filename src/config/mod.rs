//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI port argument
//!     → ProxyConfig::with_port (defaults for everything else)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to every connection handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; the binary exposes only the port
//! - Library users and tests may override fields before startup

pub mod schema;
pub mod validation;

pub use schema::HardeningConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::RewriteConfig;
pub use schema::TimeoutConfig;
pub use schema::UpstreamConfig;
pub use validation::{validate_config, ValidationError};
