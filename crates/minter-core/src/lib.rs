//! Bulk compressed-asset minting pipeline.
//!
//! Data flows through the modules in this order:
//!
//! - [`credentials`] resolves the signing keypair
//! - [`provisioner`] creates the accumulator and, optionally, the registry
//! - [`executor`] mints items one by one with retry, progress and cancellation
//! - [`verifier`] cross-checks a sample of receipts against the indexer
//!
//! [`pipeline::MintPipeline`] wires them together and returns a
//! [`pipeline::MintReport`]. [`cost`] and [`profile`] are pure helpers.
//!
//! # Example
//!
//! ```ignore
//! use minter_core::{MintPipeline, MintProfile, NoProgress, PipelineConfig};
//! use minter_transport::SimulatedLedger;
//! use tokio_util::sync::CancellationToken;
//!
//! let ledger = SimulatedLedger::new("Payer111");
//! let config = PipelineConfig::new(MintProfile::Collection, "Drop", 100);
//! let report = MintPipeline::new(&ledger, &ledger, config)
//!     .run(&NoProgress, &CancellationToken::new())
//!     .await?;
//! ```

pub mod assets;
pub mod cost;
pub mod credentials;
pub mod executor;
pub mod pipeline;
pub mod profile;
pub mod provisioner;
pub mod verifier;

pub use assets::list_owned_assets;
pub use cost::{format_sol, CostBreakdown, CostModel};
pub use credentials::{CredentialError, CredentialProvider, CredentialSource, Keypair};
pub use executor::{BulkMintExecutor, NoProgress, ProgressReporter};
pub use pipeline::{MintPipeline, MintReport, PipelineConfig, PipelineError};
pub use profile::{MintProfile, ProfileSettings};
pub use provisioner::{AccumulatorProvisioner, ProvisionError, RegistryInitializer};
pub use verifier::VerificationPoller;
