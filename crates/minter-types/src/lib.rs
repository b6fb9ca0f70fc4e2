//! Shared types for the cnft-minter workspace.
//!
//! This crate holds the data model that flows between the transport layer,
//! the minting core and the CLI, so none of them has to depend on the other.
//!
//! ## Job Types
//!
//! The [`job`] module describes what to mint:
//! - [`MintJob`](job::MintJob) - validated, immutable description of one run
//! - [`ItemDescriptor`](job::ItemDescriptor) - per-index item name derivation
//!
//! ## Outcome Types
//!
//! The [`outcome`] module describes what happened:
//! - [`SubmissionOutcome`](outcome::SubmissionOutcome) - one entry per attempted item
//! - [`ProgressState`](outcome::ProgressState) - live `current / total` counter
//! - [`VerificationRecord`](outcome::VerificationRecord) - indexer cross-check result

pub mod encoding;
pub mod env_utils;
pub mod handles;
pub mod job;
pub mod outcome;

pub use env_utils::{env_bool, env_millis_or, env_secs_or, env_var, env_var_or};
pub use handles::{AccumulatorHandle, ItemId, Receipt, RegistryHandle};
pub use job::{
    validate_request, ItemDescriptor, JobError, MintJob, MAX_ITEM_NAME_LEN, MAX_NAME_PREFIX_LEN,
};
pub use outcome::{
    ProgressState, SubmissionOutcome, SubmissionStatus, VerificationRecord, VerificationSubject,
};

use std::time::Duration;

/// Retry behavior for transient per-item submission failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total submission rounds allowed for one item, including the first.
    pub max_attempts: u32,
    /// First backoff after a rate-limited round; doubles on every further round.
    pub rate_limit_backoff: Duration,
    /// Upper bound for the doubled rate-limit backoff.
    pub max_backoff: Duration,
    /// Fixed wait after the accumulator or registry reported it is not active yet.
    pub not_yet_active_delay: Duration,
}

impl RetryPolicy {
    /// Create a new RetryPolicy with the specified parameters.
    pub fn new(
        max_attempts: u32,
        rate_limit_backoff_ms: u64,
        max_backoff_ms: u64,
        not_yet_active_delay_ms: u64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            rate_limit_backoff: Duration::from_millis(rate_limit_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
            not_yet_active_delay: Duration::from_millis(not_yet_active_delay_ms),
        }
    }

    /// Backoff to apply after the given (1-based) rate-limited attempt.
    ///
    /// Attempt 1 waits the base backoff, attempt 2 twice that, and so on,
    /// capped at `max_backoff`.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.rate_limit_backoff
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Whether another round is allowed after `attempts` rounds have run.
    pub fn allows_another(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            rate_limit_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            not_yet_active_delay: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_delay(1), Duration::from_secs(1));
        assert_eq!(policy.rate_limit_delay(2), Duration::from_secs(2));
        assert_eq!(policy.rate_limit_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_rate_limit_delay_is_capped() {
        let policy = RetryPolicy::new(40, 1000, 5000, 5000);
        assert_eq!(policy.rate_limit_delay(4), Duration::from_secs(5));
        assert_eq!(policy.rate_limit_delay(40), Duration::from_secs(5));
    }

    #[test]
    fn test_allows_another() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(3));
        assert!(!policy.allows_another(4));
    }

    #[test]
    fn test_max_attempts_never_zero() {
        let policy = RetryPolicy::new(0, 10, 10, 10);
        assert_eq!(policy.max_attempts, 1);
    }
}
