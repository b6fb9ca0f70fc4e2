//! Keypair command - show the resolved signer

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use super::output::{format_error, print_json};
use super::CliContext;

#[derive(Parser, Debug)]
pub struct KeypairCmd {
    /// Keypair file (JSON array, base58 or base64)
    #[arg(long)]
    pub keypair: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct KeypairOutput {
    pubkey: String,
    source: String,
}

impl KeypairCmd {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let resolved = match ctx.resolve_keypair(self.keypair.as_deref()) {
            Ok(resolved) => resolved,
            Err(e) => {
                eprintln!("{}", format_error(&e, ctx.json));
                return Err(e);
            }
        };
        let output = KeypairOutput {
            pubkey: resolved.keypair.pubkey(),
            source: resolved.source.to_string(),
        };

        if ctx.json {
            print_json(&output)
        } else {
            println!("Public key: {}", output.pubkey);
            println!("Source:     {}", output.source);
            Ok(())
        }
    }
}
