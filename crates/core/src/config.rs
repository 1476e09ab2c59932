//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services
//! as `Arc<CoreConfig>`. Reading process-wide environment variables during
//! request handling leads to inconsistent behaviour in multi-threaded
//! runtimes and test harnesses, so the env parsing here is pure: it takes
//! the raw values and never touches `std::env` itself.

use crate::{OpdError, OpdResult};
use std::time::Duration;

const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 50;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    max_transient_retries: u32,
    retry_backoff: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `max_transient_retries` is the number of re-executions after the
    /// first attempt; it must be at least 1 so that a single deadlock victim
    /// does not surface to the caller.
    pub fn new(max_transient_retries: u32, retry_backoff: Duration) -> OpdResult<Self> {
        if max_transient_retries == 0 {
            return Err(OpdError::Validation(
                "max_transient_retries must be at least 1".into(),
            ));
        }

        Ok(Self {
            max_transient_retries,
            retry_backoff,
        })
    }

    pub fn max_transient_retries(&self) -> u32 {
        self.max_transient_retries
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Parse a `CoreConfig` from optional raw environment values.
///
/// `None` or empty/whitespace values fall back to the defaults.
///
/// # Errors
///
/// Returns `OpdError::Validation` if a supplied value does not parse or is
/// out of range.
pub fn config_from_env_values(
    max_retries: Option<String>,
    backoff_ms: Option<String>,
) -> OpdResult<CoreConfig> {
    fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    let max_retries = match non_empty(max_retries) {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            OpdError::Validation(format!("OPD_MAX_RETRIES must be an integer, got '{raw}'"))
        })?,
        None => DEFAULT_MAX_TRANSIENT_RETRIES,
    };

    let backoff_ms = match non_empty(backoff_ms) {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            OpdError::Validation(format!(
                "OPD_RETRY_BACKOFF_MS must be an integer, got '{raw}'"
            ))
        })?,
        None => DEFAULT_RETRY_BACKOFF_MS,
    };

    CoreConfig::new(max_retries, Duration::from_millis(backoff_ms))
}
