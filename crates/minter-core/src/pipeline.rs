//! End-to-end mint run: provision, mint, verify, report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use minter_transport::{AssetIndex, LedgerClient};
use minter_types::{
    validate_request, AccumulatorHandle, JobError, MintJob, ProgressState, RegistryHandle,
    RetryPolicy, SubmissionOutcome, SubmissionStatus, VerificationRecord,
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::cost::{CostBreakdown, CostModel};
use crate::executor::{BulkMintExecutor, ProgressReporter};
use crate::profile::MintProfile;
use crate::provisioner::{
    registry_name, AccumulatorProvisioner, ProvisionError, RegistryInitializer,
    DEFAULT_ACTIVATION_DELAY,
};
use crate::verifier::{
    VerificationPoller, DEFAULT_METADATA_DELAY, DEFAULT_RESOLVE_DELAY, DEFAULT_VERIFY_LIMIT,
};

/// Errors that stop a run before any item is minted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid mint job: {0}")]
    Job(#[from] JobError),

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
}

/// Everything a run needs besides the ledger.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub name_prefix: String,
    pub quantity: u32,
    pub profile: MintProfile,
    pub max_depth: u32,
    pub max_buffer_size: u32,
    pub with_registry: bool,
    pub inter_item_delay: Duration,
    pub activation_delay: Duration,
    pub retry: RetryPolicy,
    pub verify: bool,
    pub verify_limit: usize,
    pub resolve_delay: Duration,
    pub metadata_delay: Duration,
    /// Mint into this accumulator instead of creating one.
    pub existing_accumulator: Option<AccumulatorHandle>,
}

impl PipelineConfig {
    pub fn new(profile: MintProfile, name_prefix: impl Into<String>, quantity: u32) -> Self {
        let settings = profile.settings();
        Self {
            name_prefix: name_prefix.into(),
            quantity,
            profile,
            max_depth: settings.max_depth,
            max_buffer_size: settings.max_buffer_size,
            with_registry: settings.with_registry,
            inter_item_delay: settings.inter_item_delay,
            activation_delay: DEFAULT_ACTIVATION_DELAY,
            retry: RetryPolicy::default(),
            verify: true,
            verify_limit: DEFAULT_VERIFY_LIMIT,
            resolve_delay: DEFAULT_RESOLVE_DELAY,
            metadata_delay: DEFAULT_METADATA_DELAY,
            existing_accumulator: None,
        }
    }

    pub fn cost_model(&self) -> CostModel {
        let mut model = CostModel::for_profile(self.profile);
        if !self.with_registry {
            model.registry_lamports = 0;
        }
        if self.existing_accumulator.is_some() {
            model = model.reusing_accumulator();
        }
        model
    }

    fn depth(&self) -> u32 {
        self.existing_accumulator
            .as_ref()
            .map_or(self.max_depth, |handle| handle.max_depth)
    }
}

/// Final result of a run. Serializable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct MintReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub payer: String,
    pub profile: MintProfile,
    pub name_prefix: String,
    pub accumulator: AccumulatorHandle,
    pub registry: Option<RegistryHandle>,
    pub estimated_cost: CostBreakdown,
    pub progress: ProgressState,
    /// Stopped by cancellation before every item was attempted.
    pub cancelled: bool,
    pub sent: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub outcomes: Vec<SubmissionOutcome>,
    pub verification: Vec<VerificationRecord>,
}

impl MintReport {
    pub fn minted(&self) -> usize {
        self.sent + self.confirmed
    }

    pub fn verified(&self) -> usize {
        self.verification.iter().filter(|r| r.verified).count()
    }
}

fn count_status(outcomes: &[SubmissionOutcome], status: SubmissionStatus) -> usize {
    outcomes.iter().filter(|o| o.status == status).count()
}

pub struct MintPipeline<'a> {
    ledger: &'a dyn LedgerClient,
    index: &'a dyn AssetIndex,
    config: PipelineConfig,
}

impl<'a> MintPipeline<'a> {
    pub fn new(
        ledger: &'a dyn LedgerClient,
        index: &'a dyn AssetIndex,
        config: PipelineConfig,
    ) -> Self {
        Self {
            ledger,
            index,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(
        &self,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<MintReport, PipelineError> {
        let config = &self.config;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        // Reject before paying for anything.
        validate_request(&config.name_prefix, config.quantity, config.depth())?;

        info!(
            %run_id,
            profile = %config.profile,
            quantity = config.quantity,
            payer = self.ledger.payer(),
            "mint run started"
        );

        let accumulator = match &config.existing_accumulator {
            Some(handle) => handle.clone(),
            None => {
                AccumulatorProvisioner::new(self.ledger)
                    .with_activation_delay(config.activation_delay)
                    .provision(config.max_depth, config.max_buffer_size)
                    .await?
            }
        };

        let registry = if config.with_registry {
            Some(
                RegistryInitializer::new(self.ledger)
                    .create_registry(&registry_name(&config.name_prefix))
                    .await?,
            )
        } else {
            None
        };

        let job = MintJob::new(
            config.name_prefix.clone(),
            config.quantity,
            accumulator.clone(),
            registry.clone(),
        )?;

        let outcomes = BulkMintExecutor::new(self.ledger)
            .with_retry_policy(config.retry)
            .with_inter_item_delay(config.inter_item_delay)
            .run(&job, progress, cancel)
            .await;
        let cancelled = outcomes.len() < config.quantity as usize;

        let verification = if config.verify && !cancelled {
            VerificationPoller::new(self.ledger, self.index)
                .with_limit(config.verify_limit)
                .with_delays(config.resolve_delay, config.metadata_delay)
                .verify(&outcomes, &accumulator, cancel)
                .await
        } else {
            Vec::new()
        };

        let sent = count_status(&outcomes, SubmissionStatus::Sent);
        let confirmed = count_status(&outcomes, SubmissionStatus::Confirmed);
        let failed = count_status(&outcomes, SubmissionStatus::Failed);
        let progress = ProgressState {
            current: (sent + confirmed) as u32,
            total: config.quantity,
        };

        info!(%run_id, sent, confirmed, failed, cancelled, "mint run finished");

        Ok(MintReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            payer: self.ledger.payer().to_string(),
            profile: config.profile,
            name_prefix: config.name_prefix.clone(),
            accumulator,
            registry,
            estimated_cost: config.cost_model().breakdown(config.quantity),
            progress,
            cancelled,
            sent,
            confirmed,
            failed,
            outcomes,
            verification,
        })
    }
}
