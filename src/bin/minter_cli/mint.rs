//! Mint command - run the full pipeline
//!
//! Submissions go to the in-process simulated ledger; the fault-injection
//! flags reproduce the rate limiting and activation lag seen on real clusters.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use minter_core::{format_sol, MintPipeline, MintProfile, PipelineConfig};
use minter_transport::SimulatedLedger;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::output::{format_error, format_report, print_json};
use super::CliContext;

#[derive(Parser, Debug)]
pub struct MintCmd {
    /// Item name prefix; items are named <prefix><6-digit index>
    #[arg(long)]
    pub name_prefix: String,

    /// Number of items to mint
    #[arg(long, short)]
    pub quantity: u32,

    /// Mint profile: collection or fast
    #[arg(long, default_value = "collection")]
    pub profile: MintProfile,

    /// Tree depth (capacity 2^depth)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Tree buffer size
    #[arg(long)]
    pub max_buffer_size: Option<u32>,

    /// Mint ungrouped items even in the collection profile
    #[arg(long)]
    pub no_collection: bool,

    /// Pause between items in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Grace period after tree creation in seconds
    #[arg(long)]
    pub activation_delay_secs: Option<u64>,

    /// Submission rounds per item, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Skip verification against the indexer
    #[arg(long)]
    pub no_verify: bool,

    /// Receipts to verify after minting
    #[arg(long)]
    pub verify_limit: Option<usize>,

    /// Keypair file (JSON array, base58 or base64)
    #[arg(long)]
    pub keypair: Option<PathBuf>,

    /// Simulated ledger: rate limit every N-th submission (0 = never)
    #[arg(long, default_value_t = 0)]
    pub rate_limit_every: u64,

    /// Simulated ledger: tree activation lag in milliseconds
    #[arg(long, default_value_t = 0)]
    pub activation_lag_ms: u64,

    /// Simulated ledger: indexer visibility lag in milliseconds
    #[arg(long, default_value_t = 0)]
    pub index_lag_ms: u64,
}

impl MintCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self.execute_inner(ctx).await {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("{}", format_error(&e, ctx.json));
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, ctx: &CliContext) -> Result<()> {
        let signer = ctx.resolve_keypair(self.keypair.as_deref())?;
        let payer = signer.keypair.pubkey();
        info!(payer = %payer, source = %signer.source, "resolved signer");
        info!(
            cluster = ?ctx.config.cluster,
            commitment = %ctx.config.commitment,
            "submitting to the simulated ledger"
        );

        let config = self.pipeline_config(ctx);
        info!(
            estimated = %format_sol(config.cost_model().estimate(config.quantity)),
            "estimated cost"
        );

        let ledger = SimulatedLedger::new(payer)
            .with_rate_limit_every(self.rate_limit_every)
            .with_activation_lag(Duration::from_millis(self.activation_lag_ms))
            .with_index_lag(Duration::from_millis(self.index_lag_ms));

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current item");
                on_interrupt.cancel();
            }
        });

        let show_progress = !ctx.json;
        let progress = move |current: u32, total: u32| {
            if show_progress {
                eprint!("\rMinted {}/{}", current, total);
                if current == total {
                    eprintln!();
                }
            }
        };

        let report = MintPipeline::new(&ledger, &ledger, config)
            .run(&progress, &cancel)
            .await
            .context("mint run failed")?;
        if show_progress && report.cancelled {
            eprintln!();
        }

        if ctx.json {
            print_json(&report)
        } else {
            print!("{}", format_report(&report, ctx.verbose));
            Ok(())
        }
    }

    fn pipeline_config(&self, ctx: &CliContext) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.profile, &self.name_prefix, self.quantity);
        ctx.config.apply(&mut config);

        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(buffer) = self.max_buffer_size {
            config.max_buffer_size = buffer;
        }
        if self.no_collection {
            config.with_registry = false;
        }
        if let Some(ms) = self.delay_ms {
            config.inter_item_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.activation_delay_secs {
            config.activation_delay = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(limit) = self.verify_limit {
            config.verify_limit = limit;
        }
        config.verify = !self.no_verify;
        config
    }
}
