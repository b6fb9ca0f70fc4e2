//! cnft-minter Transport Layer
//!
//! The capabilities the minting core calls, and their implementations.
//!
//! This crate provides:
//! - [`ledger`]: the [`LedgerClient`] / [`AssetIndex`] traits and the structured [`LedgerError`]
//! - [`das`]: blocking DAS JSON-RPC client for the indexing service
//! - [`network`]: cluster inference and RPC endpoint resolution
//! - [`simulated`]: in-process ledger used by tests and dry runs
//!
//! # Example
//!
//! ```ignore
//! use minter_transport::{network, DasClient, AssetIndex};
//!
//! let endpoint = network::resolve_rpc_endpoint(None);
//! let das = DasClient::new(&endpoint);
//! let assets = das.query_items_by_owner("Owner111...", None).await?;
//! ```

pub mod das;
pub mod ledger;
pub mod network;
pub mod simulated;

pub use das::DasClient;
pub use ledger::{
    Asset, AssetIndex, Creator, ErrorKind, ItemMetadata, LedgerClient, LedgerError, Operation,
    RegistryMetadata, SubmitMode, Submitted,
};
pub use network::{resolve_rpc_endpoint, Cluster};
pub use simulated::SimulatedLedger;
