//! CLI subcommand implementations for cnft-minter

pub mod assets;
pub mod estimate;
pub mod keypair;
pub mod mint;
pub mod output;

use std::path::Path;

use anyhow::{Context, Result};
use cnft_minter::MinterConfig;
use minter_core::credentials::{CredentialProvider, ResolvedKeypair};

/// Settings shared by every subcommand.
pub struct CliContext {
    pub config: MinterConfig,
    pub json: bool,
    pub verbose: bool,
}

impl CliContext {
    /// Resolve the signer. An explicit `--keypair` path is the only source searched;
    /// otherwise env vars, then the config's keypair path, then `~/.config/solana/id.json`.
    pub fn resolve_keypair(&self, explicit: Option<&Path>) -> Result<ResolvedKeypair> {
        let mut provider = CredentialProvider::default();
        if let Some(path) = &self.config.keypair_path {
            provider = provider.with_path_first(path);
        }
        if let Some(path) = explicit {
            provider = CredentialProvider::empty().with_path(path);
        }
        provider
            .resolve_keypair()
            .context("failed to resolve signing keypair")
    }
}
