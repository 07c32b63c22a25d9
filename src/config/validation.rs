//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of values the type system cannot express
//! - Validate value ranges (timeouts > 0, connection limit > 0)
//! - Check the upstream origin is a bare absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before the listener is bound

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Origin could not be parsed as a URL.
    #[error("upstream origin '{origin}' is not a valid URL: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// Origin uses a scheme other than http or https.
    #[error("upstream origin scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    /// Origin carries a path, query or trailing slash.
    #[error("upstream origin '{0}' must not contain a path, query or trailing slash")]
    OriginHasPath(String),

    /// A timeout was configured as zero.
    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    /// Connection limit was configured as zero.
    #[error("max_connections must be greater than zero")]
    ZeroConnectionLimit,
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_origin(&config.upstream.origin, &mut errors);

    if config.timeouts.request_line_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_line_secs"));
    }
    if config.timeouts.fetch_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("fetch_secs"));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnectionLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_origin(origin: &str, errors: &mut Vec<ValidationError>) {
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => {
            errors.push(ValidationError::InvalidOrigin {
                origin: origin.to_string(),
                reason: e.to_string(),
            });
            return;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }

    // Url normalizes an empty path to "/", so look at the raw string.
    if origin.ends_with('/') || url.path() != "/" || url.query().is_some() {
        errors.push(ValidationError::OriginHasPath(origin.to_string()));
    }
}
