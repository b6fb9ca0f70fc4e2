//! Estimate command - approximate cost of a mint run

use anyhow::Result;
use clap::Parser;
use minter_core::{CostModel, MintProfile};
use serde::Serialize;

use super::output::{format_cost, print_json};
use super::CliContext;

#[derive(Parser, Debug)]
pub struct EstimateCmd {
    /// Number of items to mint
    #[arg(long, short)]
    pub quantity: u32,

    /// Mint profile: collection or fast
    #[arg(long, default_value = "collection")]
    pub profile: MintProfile,

    /// Mint into an existing tree (no tree rent)
    #[arg(long)]
    pub reuse_tree: bool,
}

#[derive(Debug, Serialize)]
struct EstimateOutput {
    profile: MintProfile,
    #[serde(flatten)]
    breakdown: minter_core::CostBreakdown,
    total_sol: String,
}

impl EstimateCmd {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let mut model = CostModel::for_profile(self.profile);
        if self.reuse_tree {
            model = model.reusing_accumulator();
        }
        let breakdown = model.breakdown(self.quantity);

        if ctx.json {
            print_json(&EstimateOutput {
                profile: self.profile,
                breakdown,
                total_sol: minter_core::format_sol(breakdown.total_lamports),
            })
        } else {
            println!("Profile:      {}", self.profile);
            print!("{}", format_cost(&breakdown));
            Ok(())
        }
    }
}
