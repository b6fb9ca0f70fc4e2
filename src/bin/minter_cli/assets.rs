//! Assets command - list compressed assets held by an owner

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use minter_core::list_owned_assets;
use minter_transport::DasClient;
use minter_types::encoding::is_valid_address;
use tracing::info;

use super::output::{format_assets, print_json};
use super::CliContext;

#[derive(Parser, Debug)]
pub struct AssetsCmd {
    /// Owner address (default: the resolved keypair's public key)
    #[arg(long)]
    pub owner: Option<String>,

    /// Only list assets in this collection
    #[arg(long)]
    pub collection: Option<String>,

    /// Keypair file used when --owner is omitted
    #[arg(long)]
    pub keypair: Option<PathBuf>,
}

impl AssetsCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let owner = match &self.owner {
            Some(owner) => owner.clone(),
            None => ctx
                .resolve_keypair(self.keypair.as_deref())?
                .keypair
                .pubkey(),
        };
        if !is_valid_address(&owner) {
            bail!("'{}' is not a valid base58 address", owner);
        }

        let das = DasClient::new(&ctx.config.rpc_url);
        info!(
            endpoint = %minter_transport::das::redact_api_key(das.endpoint()),
            cluster = ?ctx.config.cluster,
            "querying DAS"
        );
        let assets = list_owned_assets(&das, &owner, self.collection.as_deref()).await;

        if ctx.json {
            print_json(&assets)
        } else {
            print!("{}", format_assets(&owner, &assets));
            Ok(())
        }
    }
}
