//! Approximate cost of a mint run, for display only.

use serde::Serialize;

use crate::profile::MintProfile;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Fee schedule in lamports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostModel {
    /// Rent for a new accumulator; zero when an existing one is reused.
    pub accumulator_lamports: u64,
    pub registry_lamports: u64,
    pub per_item_lamports: u64,
    pub fee_lamports: u64,
    pub fee_batch_size: u32,
}

/// Itemized estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub quantity: u32,
    pub provisioning_lamports: u64,
    pub items_lamports: u64,
    pub fees_lamports: u64,
    pub total_lamports: u64,
}

impl CostModel {
    pub fn for_profile(profile: MintProfile) -> Self {
        let settings = profile.settings();
        Self {
            accumulator_lamports: 350_000_000,
            registry_lamports: if settings.with_registry { 10_000_000 } else { 0 },
            per_item_lamports: 10_000,
            fee_lamports: 5_000,
            fee_batch_size: settings.fee_batch_size,
        }
    }

    pub fn reusing_accumulator(mut self) -> Self {
        self.accumulator_lamports = 0;
        self
    }

    pub fn provisioning_lamports(&self) -> u64 {
        self.accumulator_lamports + self.registry_lamports
    }

    /// Total estimated lamports for `quantity` items. Pure and non-decreasing.
    pub fn estimate(&self, quantity: u32) -> u64 {
        self.breakdown(quantity).total_lamports
    }

    pub fn breakdown(&self, quantity: u32) -> CostBreakdown {
        let quantity_u64 = u64::from(quantity);
        let batches = quantity_u64.div_ceil(u64::from(self.fee_batch_size.max(1)));
        let provisioning_lamports = self.provisioning_lamports();
        let items_lamports = quantity_u64 * self.per_item_lamports;
        let fees_lamports = batches * self.fee_lamports;
        CostBreakdown {
            quantity,
            provisioning_lamports,
            items_lamports,
            fees_lamports,
            total_lamports: provisioning_lamports + items_lamports + fees_lamports,
        }
    }
}

/// `12345678` lamports -> `"0.0123 SOL"`.
pub fn format_sol(lamports: u64) -> String {
    format!("{:.4} SOL", lamports as f64 / LAMPORTS_PER_SOL as f64)
}
