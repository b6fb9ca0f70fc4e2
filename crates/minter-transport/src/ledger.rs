//! Ledger and indexer capabilities the minting core is written against.
//!
//! The core never talks to a network directly. It submits [`Operation`]s
//! through a [`LedgerClient`] and reads indexed assets through an
//! [`AssetIndex`]. Both report failures as a structured [`LedgerError`] so
//! callers classify them by variant instead of inspecting message text.

use minter_types::{ItemId, Receipt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a ledger or indexer call.
///
/// Transports map their native signals (HTTP 429, program error codes, …)
/// onto these variants at the boundary where that information is still
/// structured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The endpoint signalled too many requests.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A referenced accumulator or registry exists but is not usable yet.
    #[error("not yet active: {0}")]
    NotYetActive(String),

    /// Anything else. Not retried automatically.
    #[error("{0}")]
    Other(String),
}

/// Classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    NotYetActive,
    Other,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::RateLimited(_) => ErrorKind::RateLimited,
            LedgerError::NotYetActive(_) => ErrorKind::NotYetActive,
            LedgerError::Other(_) => ErrorKind::Other,
        }
    }

    /// Rate limiting and activation lag clear up by themselves; retrying makes sense.
    pub fn is_transient(&self) -> bool {
        !matches!(self, LedgerError::Other(_))
    }
}

/// How long `submit` waits before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Return as soon as the node accepted the transaction.
    FireAndForget,
    /// Return once the transaction reached the configured commitment.
    Confirmed,
}

/// A creator entry in item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub address: String,
    pub verified: bool,
    /// Royalty share in percent.
    pub share: u8,
}

/// Metadata written into a compressed item leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
}

/// Metadata for a registry (collection) descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    /// Marks the descriptor as a collection other items can be grouped under.
    pub is_collection: bool,
}

/// A signed request the ledger can execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Allocate a concurrent merkle tree with the given shape.
    CreateAccumulator {
        max_depth: u32,
        max_buffer_size: u32,
    },
    /// Create a collection descriptor.
    CreateRegistry { metadata: RegistryMetadata },
    /// Append one compressed item to an accumulator.
    MintItem {
        accumulator: String,
        registry: Option<String>,
        owner: String,
        metadata: ItemMetadata,
    },
}

impl Operation {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::CreateAccumulator { .. } => "create_accumulator",
            Operation::CreateRegistry { .. } => "create_registry",
            Operation::MintItem { .. } => "mint_item",
        }
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitted {
    pub receipt: Receipt,
    /// Address of the account the operation created, if it created one.
    pub created: Option<String>,
}

/// An indexed asset as reported by the indexing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: ItemId,
    pub name: Option<String>,
    pub owner: Option<String>,
    /// Collection the asset is grouped under, if any.
    pub collection: Option<String>,
}

/// Submission side of the ledger.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Public key (base58) of the signer paying for and owning minted items.
    fn payer(&self) -> &str;

    /// Sign and submit an operation.
    async fn submit(&self, operation: &Operation, mode: SubmitMode)
        -> Result<Submitted, LedgerError>;

    /// Resolve the item a mint transaction produced.
    async fn resolve_item_identity(&self, receipt: &Receipt) -> Result<ItemId, LedgerError>;
}

/// Read side: the eventually-consistent indexing service.
#[async_trait::async_trait]
pub trait AssetIndex: Send + Sync {
    /// Fetch display metadata for one item.
    async fn query_metadata(&self, id: &ItemId) -> Result<Asset, LedgerError>;

    /// List items held by `owner`, optionally restricted to one collection.
    async fn query_items_by_owner(
        &self,
        owner: &str,
        collection: Option<&str>,
    ) -> Result<Vec<Asset>, LedgerError>;
}
