//! Mint profiles: accumulator shape, grouping and pacing presets.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintProfile {
    /// Items grouped under a freshly created collection, minted quickly.
    #[default]
    Collection,
    /// Smaller accumulator, ungrouped items, slower pacing.
    Fast,
}

/// Concrete settings a profile expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSettings {
    pub max_depth: u32,
    pub max_buffer_size: u32,
    pub with_registry: bool,
    pub inter_item_delay: Duration,
    /// Items whose transaction fees are charged together in the cost model.
    pub fee_batch_size: u32,
}

impl MintProfile {
    pub fn settings(self) -> ProfileSettings {
        match self {
            MintProfile::Collection => ProfileSettings {
                max_depth: 14,
                max_buffer_size: 64,
                with_registry: true,
                inter_item_delay: Duration::from_millis(50),
                fee_batch_size: 5,
            },
            MintProfile::Fast => ProfileSettings {
                max_depth: 10,
                max_buffer_size: 32,
                with_registry: false,
                inter_item_delay: Duration::from_millis(500),
                fee_batch_size: 1,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MintProfile::Collection => "collection",
            MintProfile::Fast => "fast",
        }
    }
}

impl fmt::Display for MintProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MintProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collection" => Ok(MintProfile::Collection),
            "fast" => Ok(MintProfile::Fast),
            other => Err(format!(
                "unknown profile '{}' (expected 'collection' or 'fast')",
                other
            )),
        }
    }
}
