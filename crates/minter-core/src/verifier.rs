//! Post-mint verification against the indexing service.
//!
//! The indexer lags behind submission, so each lookup is preceded by a short
//! settle delay, and anything that cannot be resolved ends up as an
//! unverified record instead of an error. Cancellation interrupts a settle
//! delay and stops the pass with the records gathered so far.

use std::time::Duration;

use minter_transport::{AssetIndex, LedgerClient};
use minter_types::encoding::short_id;
use minter_types::{
    AccumulatorHandle, SubmissionOutcome, VerificationRecord, VerificationSubject,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Receipt-bearing outcomes checked per run.
pub const DEFAULT_VERIFY_LIMIT: usize = 10;
pub const DEFAULT_RESOLVE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_METADATA_DELAY: Duration = Duration::from_secs(2);

pub struct VerificationPoller<'a> {
    ledger: &'a dyn LedgerClient,
    index: &'a dyn AssetIndex,
    limit: usize,
    resolve_delay: Duration,
    metadata_delay: Duration,
}

impl<'a> VerificationPoller<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, index: &'a dyn AssetIndex) -> Self {
        Self {
            ledger,
            index,
            limit: DEFAULT_VERIFY_LIMIT,
            resolve_delay: DEFAULT_RESOLVE_DELAY,
            metadata_delay: DEFAULT_METADATA_DELAY,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_delays(mut self, resolve: Duration, metadata: Duration) -> Self {
        self.resolve_delay = resolve;
        self.metadata_delay = metadata;
        self
    }

    /// One record per checked outcome, in outcome order. Never fails.
    pub async fn verify(
        &self,
        outcomes: &[SubmissionOutcome],
        accumulator: &AccumulatorHandle,
        cancel: &CancellationToken,
    ) -> Vec<VerificationRecord> {
        let mut records = Vec::new();
        let candidates = outcomes
            .iter()
            .filter_map(|o| o.receipt.as_ref().map(|receipt| (o, receipt)))
            .take(self.limit);

        for (outcome, receipt) in candidates {
            if !settle(self.resolve_delay, cancel).await {
                info!(checked = records.len(), "verification cancelled");
                break;
            }
            let id = match self.ledger.resolve_item_identity(receipt).await {
                Ok(id) => id,
                Err(err) => {
                    debug!(
                        index = outcome.index,
                        receipt = %short_id(receipt.as_str()),
                        error = %err,
                        "item identity unresolved"
                    );
                    records.push(VerificationRecord::unresolved(
                        receipt.clone(),
                        outcome.name.clone(),
                    ));
                    continue;
                }
            };

            if !settle(self.metadata_delay, cancel).await {
                info!(checked = records.len(), "verification cancelled");
                break;
            }
            let resolved_name = match self.index.query_metadata(&id).await {
                Ok(asset) => asset.name,
                Err(err) => {
                    debug!(index = outcome.index, item = %id, error = %err, "metadata unavailable");
                    None
                }
            };
            let verified = resolved_name.as_deref() == Some(outcome.name.as_str());
            records.push(VerificationRecord {
                subject: VerificationSubject::Item(id),
                expected_name: outcome.name.clone(),
                resolved_name,
                verified,
            });
        }

        info!(
            accumulator = %short_id(&accumulator.address),
            checked = records.len(),
            verified = records.iter().filter(|r| r.verified).count(),
            "verification finished"
        );
        records
    }
}

/// Sleep for `delay`; `false` if `cancel` fired first.
async fn settle(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{BulkMintExecutor, NoProgress};
    use crate::provisioner::AccumulatorProvisioner;
    use minter_transport::SimulatedLedger;
    use minter_types::{MintJob, Receipt, SubmissionStatus};
    use tokio_util::sync::CancellationToken;

    async fn mint(ledger: &SimulatedLedger, quantity: u32) -> (AccumulatorHandle, Vec<SubmissionOutcome>) {
        let handle = AccumulatorProvisioner::new(ledger)
            .with_activation_delay(Duration::ZERO)
            .provision(10, 32)
            .await
            .unwrap();
        let job = MintJob::new("Test", quantity, handle.clone(), None).unwrap();
        let outcomes = BulkMintExecutor::new(ledger)
            .run(&job, &NoProgress, &CancellationToken::new())
            .await;
        (handle, outcomes)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_receipt_unresolved() {
        let ledger = SimulatedLedger::new("Payer111");
        ledger.fail_resolution_for("Test000002");
        let (handle, outcomes) = mint(&ledger, 3).await;

        let records = VerificationPoller::new(&ledger, &ledger)
            .verify(&outcomes, &handle, &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 3);
        assert!(records[0].verified);
        assert_eq!(records[0].resolved_name.as_deref(), Some("Test000001"));
        assert!(!records[1].verified);
        assert!(records[1].item_id().is_none());
        assert!(records[2].verified);
        assert_eq!(records[2].resolved_name.as_deref(), Some("Test000003"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_and_failed_outcomes_are_skipped() {
        let ledger = SimulatedLedger::new("Payer111");
        let (handle, mut outcomes) = mint(&ledger, 12).await;
        outcomes[0].status = SubmissionStatus::Failed;
        outcomes[0].receipt = None;

        let records = VerificationPoller::new(&ledger, &ledger)
            .verify(&outcomes, &handle, &CancellationToken::new())
            .await;
        assert_eq!(records.len(), DEFAULT_VERIFY_LIMIT);
        assert_eq!(records[0].expected_name, "Test000002");
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_lag_leaves_item_unverified() {
        let ledger = SimulatedLedger::new("Payer111").with_index_lag(Duration::from_secs(60));
        let (handle, outcomes) = mint(&ledger, 1).await;

        let records = VerificationPoller::new(&ledger, &ledger)
            .verify(&outcomes, &handle, &CancellationToken::new())
            .await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].verified);
        assert!(records[0].item_id().is_some());
        assert!(records[0].resolved_name.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_during_settle_delay() {
        let ledger = SimulatedLedger::new("Payer111");
        let (handle, outcomes) = mint(&ledger, 5).await;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            // Inside the second item's metadata delay (1 s + 2 s + 1 s + 0.5 s).
            tokio::time::sleep(Duration::from_millis(4_500)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        let records = VerificationPoller::new(&ledger, &ledger)
            .verify(&outcomes, &handle, &cancel)
            .await;
        assert_eq!(records.len(), 1);
        assert!(records[0].verified);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_receipt() {
        let ledger = SimulatedLedger::new("Payer111");
        let (handle, mut outcomes) = mint(&ledger, 1).await;
        outcomes[0].receipt = Some(Receipt::new("unknown"));
        let records = VerificationPoller::new(&ledger, &ledger)
            .with_delays(Duration::ZERO, Duration::ZERO)
            .verify(&outcomes, &handle, &CancellationToken::new())
            .await;
        assert_eq!(
            records[0].subject,
            VerificationSubject::Receipt(Receipt::new("unknown"))
        );
    }
}
