//! cnft-minter
//!
//! Command-line front end for bulk minting compressed NFTs:
//!
//! - **Configuration**: Solana CLI config file plus environment overrides ([`config`])
//! - **Logging**: `tracing` subscriber setup ([`logging`])
//!
//! The minting pipeline itself lives in `minter-core`; ledger and indexer
//! access in `minter-transport`.

pub mod config;
pub mod logging;

pub use config::{ConfigError, MinterConfig, SolanaCliConfig};
