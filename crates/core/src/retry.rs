//! Retry-on-transient-failure wrapper around the transaction boundary.
//!
//! The retried unit is the whole reconciliation-and-commit closure: a replay
//! re-runs the resolution queries against current store state, so
//! find-or-create stays idempotent as long as the failed attempt did not
//! partially commit (which the transaction guarantees). Only
//! [`Transient`](crate::OpdError::Transient) errors are retried — retrying a
//! validation or not-found failure cannot change the outcome.

use crate::config::CoreConfig;
use crate::OpdResult;
use std::time::Duration;

/// Runs `op`, re-executing it after transient failures.
///
/// `op` is attempted once plus up to `max_transient_retries` more times,
/// with an exponential backoff starting at the configured base. The last
/// error is returned once attempts are exhausted.
pub fn run_with_retry<R, F>(cfg: &CoreConfig, mut op: F) -> OpdResult<R>
where
    F: FnMut() -> OpdResult<R>,
{
    let max_retries = cfg.max_transient_retries();
    let mut attempt: u32 = 0;

    loop {
        match op() {
            Ok(outcome) => return Ok(outcome),
            Err(err) if err.is_transient() && attempt < max_retries => {
                attempt += 1;
                let backoff = backoff_for_attempt(cfg.retry_backoff(), attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "transient storage failure, retrying"
                );
                std::thread::sleep(backoff);
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_for_attempt(base: Duration, attempt: u32) -> Duration {
    // 1x, 2x, 4x, ... capped so a misconfigured base cannot stall a request.
    const MAX_BACKOFF: Duration = Duration::from_secs(2);
    let factor = 1u32 << (attempt - 1).min(8);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpdError, OpdResult};

    fn test_cfg(retries: u32) -> CoreConfig {
        CoreConfig::new(retries, Duration::from_millis(1)).expect("valid test config")
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let mut remaining_failures = 2;
        let result = run_with_retry(&test_cfg(3), || -> OpdResult<&str> {
            if remaining_failures > 0 {
                remaining_failures -= 1;
                return Err(OpdError::Transient("connection reset".into()));
            }
            Ok("done")
        });

        assert_eq!(result.expect("should recover"), "done");
        assert_eq!(remaining_failures, 0);
    }

    #[test]
    fn retries_are_bounded() {
        let mut attempts = 0;
        let result = run_with_retry(&test_cfg(2), || -> OpdResult<()> {
            attempts += 1;
            Err(OpdError::Transient("deadlock victim".into()))
        });

        assert!(matches!(result, Err(OpdError::Transient(_))));
        assert_eq!(attempts, 3, "one initial attempt plus two retries");
    }

    #[test]
    fn non_transient_errors_fail_immediately() {
        let mut attempts = 0;
        let result = run_with_retry(&test_cfg(5), || -> OpdResult<()> {
            attempts += 1;
            Err(OpdError::Validation("bad request".into()))
        });

        assert!(matches!(result, Err(OpdError::Validation(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let base = Duration::from_millis(50);
        assert_eq!(backoff_for_attempt(base, 1), Duration::from_millis(50));
        assert_eq!(backoff_for_attempt(base, 2), Duration::from_millis(100));
        assert_eq!(backoff_for_attempt(base, 3), Duration::from_millis(200));
        assert_eq!(backoff_for_attempt(base, 30), Duration::from_secs(2));
    }
}
