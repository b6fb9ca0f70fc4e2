//! cnft-minter: bulk minting of compressed NFTs
//!
//! ## Commands
//!
//! - **estimate**: Approximate cost of a run
//! - **keypair**: Show which signing keypair would be used
//! - **mint**: Provision an accumulator and mint a batch of items
//! - **assets**: List compressed assets held by an owner (DAS)
//!
//! ## Example Usage
//!
//! ```bash
//! # What would 1,000 items cost?
//! cnft-minter estimate --quantity 1000
//!
//! # Dry-run a 50 item collection mint against the simulated ledger
//! cnft-minter mint --name-prefix Drop --quantity 50 --rate-limit-every 7
//!
//! # List assets through a Helius endpoint
//! HELIUS_RPC_URL=https://devnet.helius-rpc.com HELIUS_API_KEY=... \
//!     cnft-minter assets --owner 9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod minter_cli;

use cnft_minter::{logging, MinterConfig};
use minter_cli::{
    assets::AssetsCmd, estimate::EstimateCmd, keypair::KeypairCmd, mint::MintCmd, CliContext,
};

#[derive(Parser)]
#[command(
    name = "cnft-minter",
    author,
    version,
    about = "Bulk mint compressed NFTs",
    long_about = "Provision a concurrent merkle tree, mint items into it one by one with \
                  retry and backoff, then verify a sample against the DAS indexer."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana CLI config file (default: ~/.config/solana/cli/config.yml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// RPC URL (overrides environment and config file)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the cost of minting a batch
    Estimate(EstimateCmd),

    /// Resolve the signing keypair and print its public key
    Keypair(KeypairCmd),

    /// Mint a batch of compressed NFTs
    Mint(MintCmd),

    /// List compressed assets held by an owner
    Assets(AssetsCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let Cli {
        command,
        config,
        rpc_url,
        json,
        verbose,
    } = Cli::parse();

    logging::init(verbose);

    let mut config = MinterConfig::load(config.as_deref()).context("failed to load configuration")?;
    if let Some(url) = rpc_url {
        config.cluster = minter_transport::network::infer_cluster_from_url(&url);
        config.rpc_url = url;
    }
    let ctx = CliContext {
        config,
        json,
        verbose,
    };

    match command {
        Commands::Estimate(cmd) => cmd.execute(&ctx),
        Commands::Keypair(cmd) => cmd.execute(&ctx),
        Commands::Mint(cmd) => cmd.execute(&ctx).await,
        Commands::Assets(cmd) => cmd.execute(&ctx).await,
    }
}
