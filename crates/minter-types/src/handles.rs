//! Opaque references returned by the ledger.
//!
//! Handles are created once per job by provisioning and are never mutated
//! afterwards; every mint in the job reuses the same handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction handle returned by a successful submission (a base58 signature).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receipt(String);

impl Receipt {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a minted compressed item, as reported by the indexing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The shared accumulator (concurrent merkle tree) every item is appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorHandle {
    /// On-ledger account address (base58).
    pub address: String,
    pub max_depth: u32,
    pub max_buffer_size: u32,
    /// Receipt of the creation operation.
    pub created_by: Receipt,
}

impl AccumulatorHandle {
    /// Number of leaves the accumulator can hold (2^depth).
    pub fn capacity(&self) -> u64 {
        1u64 << self.max_depth.min(63)
    }
}

/// Grouping descriptor ("collection") minted items are registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHandle {
    /// On-ledger mint address of the collection (base58).
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub is_collection: bool,
    /// Receipt of the creation operation.
    pub created_by: Receipt,
}
