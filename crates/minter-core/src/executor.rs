//! Sequential bulk mint executor.
//!
//! Items are minted strictly one at a time, in index order, against the
//! job's accumulator. Each item goes through submission rounds:
//!
//! 1. fire-and-forget send
//! 2. if that fails with a non-transient error, one confirmed send of the same operation
//!
//! A round that ends in a transient error (rate limited, not yet active) is
//! retried after a backoff until the retry policy's attempt bound is reached.
//! Anything else marks the item `Failed` and the run moves on. The run never
//! fails as a whole; it returns one outcome per attempted item.

use std::time::Duration;

use minter_transport::{
    Creator, ErrorKind, ItemMetadata, LedgerClient, LedgerError, Operation, SubmitMode,
};
use minter_types::{
    ItemDescriptor, MintJob, ProgressState, Receipt, RetryPolicy, SubmissionOutcome,
    SubmissionStatus,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provisioner::{DEFAULT_IMAGE_URI, DEFAULT_SYMBOL};

/// Default pause between items.
pub const DEFAULT_INTER_ITEM_DELAY: Duration = Duration::from_millis(50);

/// Receives progress after every successful item.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: ProgressState);
}

impl<F> ProgressReporter for F
where
    F: Fn(u32, u32) + Send + Sync,
{
    fn report(&self, progress: ProgressState) {
        self(progress.current, progress.total)
    }
}

impl ProgressReporter for watch::Sender<ProgressState> {
    fn report(&self, progress: ProgressState) {
        self.send_replace(progress);
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: ProgressState) {}
}

pub struct BulkMintExecutor<'a> {
    ledger: &'a dyn LedgerClient,
    retry: RetryPolicy,
    inter_item_delay: Duration,
    symbol: String,
    uri: String,
}

impl<'a> BulkMintExecutor<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self {
            ledger,
            retry: RetryPolicy::default(),
            inter_item_delay: DEFAULT_INTER_ITEM_DELAY,
            symbol: DEFAULT_SYMBOL.to_string(),
            uri: DEFAULT_IMAGE_URI.to_string(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    pub fn with_item_metadata(mut self, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self.uri = uri.into();
        self
    }

    /// Mint every item of `job` unless `cancel` fires first.
    ///
    /// Cancellation is checked before each item and interrupts the
    /// inter-item pause; an item already being submitted runs to completion.
    pub async fn run(
        &self,
        job: &MintJob,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Vec<SubmissionOutcome> {
        let total = job.quantity();
        let mut state = ProgressState::new(total);
        let mut outcomes = Vec::with_capacity(total as usize);

        info!(
            quantity = total,
            accumulator = %job.accumulator().address,
            grouped = job.registry().is_some(),
            delay_ms = self.inter_item_delay.as_millis() as u64,
            "starting bulk mint"
        );

        for item in job.items() {
            if cancel.is_cancelled() {
                info!(
                    completed = state.current,
                    attempted = outcomes.len(),
                    total,
                    "mint cancelled"
                );
                break;
            }

            let outcome = self.mint_item(job, &item).await;
            if outcome.succeeded() {
                state.advance();
                progress.report(state);
            }
            outcomes.push(outcome);

            if item.index < total && !self.inter_item_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.inter_item_delay) => {}
                }
            }
        }

        info!(
            minted = state.current,
            failed = outcomes.iter().filter(|o| !o.succeeded()).count(),
            total,
            "bulk mint finished"
        );
        outcomes
    }

    async fn mint_item(&self, job: &MintJob, item: &ItemDescriptor) -> SubmissionOutcome {
        let operation = self.mint_operation(job, item);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let err = match self.submit_round(&operation).await {
                Ok((status, receipt)) => {
                    debug!(index = item.index, name = %item.name, ?status, attempts, "item minted");
                    return SubmissionOutcome {
                        index: item.index,
                        name: item.name.clone(),
                        status,
                        receipt: Some(receipt),
                        attempts,
                        last_error: None,
                    };
                }
                Err(err) => err,
            };

            let delay = match err.kind() {
                ErrorKind::RateLimited => Some(self.retry.rate_limit_delay(attempts)),
                ErrorKind::NotYetActive => Some(self.retry.not_yet_active_delay),
                ErrorKind::Other => None,
            };

            match delay {
                Some(delay) if self.retry.allows_another(attempts) => {
                    warn!(
                        index = item.index,
                        attempt = attempts,
                        kind = ?err.kind(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient mint failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    warn!(
                        index = item.index,
                        name = %item.name,
                        attempts,
                        error = %err,
                        "mint failed"
                    );
                    return SubmissionOutcome {
                        index: item.index,
                        name: item.name.clone(),
                        status: SubmissionStatus::Failed,
                        receipt: None,
                        attempts,
                        last_error: Some(err.to_string()),
                    };
                }
            }
        }
    }

    /// One round: fire-and-forget, then a confirmed fallback for non-transient errors.
    async fn submit_round(
        &self,
        operation: &Operation,
    ) -> Result<(SubmissionStatus, Receipt), LedgerError> {
        match self
            .ledger
            .submit(operation, SubmitMode::FireAndForget)
            .await
        {
            Ok(submitted) => Ok((SubmissionStatus::Sent, submitted.receipt)),
            Err(err) if err.is_transient() => Err(err),
            Err(err) => {
                debug!(error = %err, "send failed, retrying with confirmation");
                self.ledger
                    .submit(operation, SubmitMode::Confirmed)
                    .await
                    .map(|submitted| (SubmissionStatus::Confirmed, submitted.receipt))
            }
        }
    }

    fn mint_operation(&self, job: &MintJob, item: &ItemDescriptor) -> Operation {
        let payer = self.ledger.payer().to_string();
        Operation::MintItem {
            accumulator: job.accumulator().address.clone(),
            registry: job.registry().map(|r| r.address.clone()),
            owner: payer.clone(),
            metadata: ItemMetadata {
                name: item.name.clone(),
                symbol: self.symbol.clone(),
                uri: self.uri.clone(),
                seller_fee_basis_points: 0,
                creators: vec![Creator {
                    address: payer,
                    verified: false,
                    share: 100,
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minter_transport::SimulatedLedger;
    use minter_types::{AccumulatorHandle, RegistryHandle};
    use std::sync::{Arc, Mutex};

    async fn setup(quantity: u32) -> (SimulatedLedger, MintJob) {
        let ledger = SimulatedLedger::new("Payer111");
        let handle = crate::provisioner::AccumulatorProvisioner::new(&ledger)
            .with_activation_delay(Duration::ZERO)
            .provision(14, 64)
            .await
            .unwrap();
        let job = MintJob::new("Test", quantity, handle, None).unwrap();
        (ledger, job)
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_items_succeed() {
        let (ledger, job) = setup(10).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = move |current: u32, total: u32| sink.lock().unwrap().push((current, total));

        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &reporter, &CancellationToken::new())
            .await;

        assert_eq!(outcomes.len(), 10);
        assert!(outcomes.iter().all(|o| o.status == SubmissionStatus::Sent));
        let indices: Vec<u32> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (1..=10).collect::<Vec<_>>());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        assert_eq!(seen.last(), Some(&(10, 10)));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_item_is_retried() {
        let (ledger, job) = setup(5).await;
        ledger.script_errors(
            "Test000003",
            [
                LedgerError::RateLimited("429".into()),
                LedgerError::RateLimited("429".into()),
            ],
        );

        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(outcomes.len(), 5);
        let third = &outcomes[2];
        assert_eq!(third.index, 3);
        assert_eq!(third.attempts, 3);
        assert_eq!(third.status, SubmissionStatus::Sent);
        assert!(outcomes
            .iter()
            .filter(|o| o.index != 3)
            .all(|o| o.attempts == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_backoff_doubles() {
        let (ledger, job) = setup(1).await;
        ledger.script_errors(
            "Test000001",
            [
                LedgerError::RateLimited("429".into()),
                LedgerError::RateLimited("429".into()),
            ],
        );
        let start = tokio::time::Instant::now();
        BulkMintExecutor::new(&ledger)
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;
        // 1s + 2s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let (ledger, job) = setup(2).await;
        ledger.script_errors(
            "Test000001",
            std::iter::repeat(LedgerError::NotYetActive("tree".into())).take(10),
        );

        let outcomes = BulkMintExecutor::new(&ledger)
            .with_retry_policy(RetryPolicy::new(4, 1000, 30_000, 5000))
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(outcomes[0].status, SubmissionStatus::Failed);
        assert_eq!(outcomes[0].attempts, 4);
        assert!(outcomes[0].receipt.is_none());
        assert!(outcomes[0].last_error.as_deref().unwrap().contains("not yet active"));
        assert_eq!(outcomes[1].status, SubmissionStatus::Sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_falls_back_to_confirmed() {
        let (ledger, job) = setup(2).await;
        ledger.script_errors("Test000001", [LedgerError::Other("blockhash expired".into())]);
        ledger.script_errors(
            "Test000002",
            [
                LedgerError::Other("send failed".into()),
                LedgerError::Other("still failing".into()),
            ],
        );

        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(outcomes[0].status, SubmissionStatus::Confirmed);
        assert_eq!(outcomes[0].attempts, 1);
        assert!(outcomes[0].receipt.is_some());
        assert_eq!(outcomes[1].status, SubmissionStatus::Failed);
        assert_eq!(outcomes[1].attempts, 1);
        assert_eq!(
            outcomes[1].last_error.as_deref(),
            Some("still failing")
        );

        let modes: Vec<SubmitMode> = ledger
            .submissions()
            .iter()
            .skip(1)
            .map(|entry| entry.mode)
            .collect();
        assert_eq!(
            modes,
            vec![
                SubmitMode::FireAndForget,
                SubmitMode::Confirmed,
                SubmitMode::FireAndForget,
                SubmitMode::Confirmed,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_before_sixth_item() {
        let (ledger, job) = setup(10).await;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let reporter = move |current: u32, _total: u32| {
            if current == 5 {
                trigger.cancel();
            }
        };

        let (tx, rx) = watch::channel(ProgressState::default());
        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &reporter, &cancel)
            .await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(ledger.leaf_count(&job.accumulator().address), Some(5));

        // A watch channel observes the same sequence.
        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &tx, &CancellationToken::new())
            .await;
        assert_eq!(outcomes.len(), 10);
        assert_eq!(*rx.borrow(), ProgressState { current: 10, total: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_mints_nothing() {
        let (ledger, job) = setup(3).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &NoProgress, &cancel)
            .await;
        assert!(outcomes.is_empty());
        assert_eq!(ledger.submission_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grouped_items_reference_registry() {
        let ledger = SimulatedLedger::new("Payer111");
        let accumulator: AccumulatorHandle = crate::provisioner::AccumulatorProvisioner::new(&ledger)
            .with_activation_delay(Duration::ZERO)
            .provision(3, 8)
            .await
            .unwrap();
        let registry: RegistryHandle = crate::provisioner::RegistryInitializer::new(&ledger)
            .create_registry("Test Collection")
            .await
            .unwrap();
        let job = MintJob::new("Test", 2, accumulator, Some(registry.clone())).unwrap();

        let outcomes = BulkMintExecutor::new(&ledger)
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;
        assert!(outcomes.iter().all(|o| o.succeeded()));

        use minter_transport::AssetIndex;
        let owned = ledger
            .query_items_by_owner("Payer111", Some(&registry.address))
            .await
            .unwrap();
        assert_eq!(owned.len(), 2);
    }
}
