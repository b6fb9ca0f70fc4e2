//! Accumulator and registry provisioning.
//!
//! Both run once per job, before any item is minted, and always submit in
//! confirmed mode. A failure here aborts the run.

use std::time::Duration;

use minter_transport::{
    LedgerClient, LedgerError, Operation, RegistryMetadata, SubmitMode, Submitted,
};
use minter_types::encoding::short_id;
use minter_types::{AccumulatorHandle, RegistryHandle};
use thiserror::Error;
use tracing::info;

/// Grace period after accumulator creation before it accepts mints.
pub const DEFAULT_ACTIVATION_DELAY: Duration = Duration::from_secs(10);

pub const DEFAULT_SYMBOL: &str = "CNFT";

pub const DEFAULT_IMAGE_URI: &str = "https://raw.githubusercontent.com/metaplex-foundation/js-examples/main/getting-started-vite/src/example.png";

/// (max_depth, max_buffer_size) pairs the concurrent merkle tree program accepts.
pub const SUPPORTED_SHAPES: &[(u32, u32)] = &[
    (3, 8),
    (5, 8),
    (6, 16),
    (7, 16),
    (8, 16),
    (9, 16),
    (10, 32),
    (11, 32),
    (12, 32),
    (13, 32),
    (14, 64),
    (14, 256),
    (14, 1024),
    (14, 2048),
    (15, 64),
    (16, 64),
    (17, 64),
    (18, 64),
    (19, 64),
    (20, 64),
    (20, 256),
    (20, 1024),
    (20, 2048),
    (24, 64),
    (24, 256),
    (24, 512),
    (24, 1024),
    (24, 2048),
    (26, 512),
    (26, 1024),
    (26, 2048),
    (30, 512),
    (30, 1024),
    (30, 2048),
];

pub fn is_supported_shape(max_depth: u32, max_buffer_size: u32) -> bool {
    SUPPORTED_SHAPES.contains(&(max_depth, max_buffer_size))
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("unsupported accumulator shape: depth {max_depth}, buffer {max_buffer_size}")]
    UnsupportedShape { max_depth: u32, max_buffer_size: u32 },

    #[error("{what} creation rejected: {source}")]
    Rejected {
        what: &'static str,
        #[source]
        source: LedgerError,
    },

    #[error("{what} creation succeeded but returned no address")]
    MissingAddress { what: &'static str },
}

fn created_address(what: &'static str, submitted: &Submitted) -> Result<String, ProvisionError> {
    submitted
        .created
        .clone()
        .ok_or(ProvisionError::MissingAddress { what })
}

/// Creates the shared accumulator and waits out its activation.
pub struct AccumulatorProvisioner<'a> {
    ledger: &'a dyn LedgerClient,
    activation_delay: Duration,
}

impl<'a> AccumulatorProvisioner<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self {
            ledger,
            activation_delay: DEFAULT_ACTIVATION_DELAY,
        }
    }

    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    pub async fn provision(
        &self,
        max_depth: u32,
        max_buffer_size: u32,
    ) -> Result<AccumulatorHandle, ProvisionError> {
        if !is_supported_shape(max_depth, max_buffer_size) {
            return Err(ProvisionError::UnsupportedShape {
                max_depth,
                max_buffer_size,
            });
        }

        let operation = Operation::CreateAccumulator {
            max_depth,
            max_buffer_size,
        };
        let submitted = self
            .ledger
            .submit(&operation, SubmitMode::Confirmed)
            .await
            .map_err(|source| ProvisionError::Rejected {
                what: "accumulator",
                source,
            })?;
        let address = created_address("accumulator", &submitted)?;

        info!(
            accumulator = %short_id(&address),
            max_depth,
            max_buffer_size,
            wait_secs = self.activation_delay.as_secs_f64(),
            "accumulator created, waiting for activation"
        );
        // No readiness query is available; a fixed grace delay stands in for one.
        tokio::time::sleep(self.activation_delay).await;

        Ok(AccumulatorHandle {
            address,
            max_depth,
            max_buffer_size,
            created_by: submitted.receipt,
        })
    }
}

/// Creates the optional collection items are grouped under.
pub struct RegistryInitializer<'a> {
    ledger: &'a dyn LedgerClient,
    symbol: String,
    uri: String,
}

impl<'a> RegistryInitializer<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self {
            ledger,
            symbol: DEFAULT_SYMBOL.to_string(),
            uri: DEFAULT_IMAGE_URI.to_string(),
        }
    }

    pub fn with_metadata(mut self, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self.uri = uri.into();
        self
    }

    pub async fn create_registry(&self, name: &str) -> Result<RegistryHandle, ProvisionError> {
        let metadata = RegistryMetadata {
            name: name.to_string(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            seller_fee_basis_points: 0,
            is_collection: true,
        };
        let submitted = self
            .ledger
            .submit(&Operation::CreateRegistry { metadata }, SubmitMode::Confirmed)
            .await
            .map_err(|source| ProvisionError::Rejected {
                what: "registry",
                source,
            })?;
        let address = created_address("registry", &submitted)?;
        info!(registry = %short_id(&address), name, "registry created");

        Ok(RegistryHandle {
            address,
            name: name.to_string(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            is_collection: true,
            created_by: submitted.receipt,
        })
    }
}

/// `"<prefix> Collection"`, or just `"Collection"` for an empty prefix.
pub fn registry_name(name_prefix: &str) -> String {
    let prefix = name_prefix.trim();
    if prefix.is_empty() {
        "Collection".to_string()
    } else {
        format!("{} Collection", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minter_transport::simulated::ACCUMULATOR_SCRIPT_KEY;
    use minter_transport::SimulatedLedger;

    #[tokio::test(start_paused = true)]
    async fn test_provision_waits_for_activation() {
        let ledger = SimulatedLedger::new("Payer");
        let start = tokio::time::Instant::now();
        let handle = AccumulatorProvisioner::new(&ledger)
            .provision(14, 64)
            .await
            .unwrap();
        assert!(start.elapsed() >= DEFAULT_ACTIVATION_DELAY);
        assert_eq!(handle.capacity(), 16_384);
        assert_eq!(ledger.submissions()[0].mode, SubmitMode::Confirmed);
    }

    #[tokio::test]
    async fn test_unsupported_shape_submits_nothing() {
        let ledger = SimulatedLedger::new("Payer");
        let err = AccumulatorProvisioner::new(&ledger)
            .provision(14, 65)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedShape { .. }));
        assert_eq!(ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_creation_is_provision_error() {
        let ledger = SimulatedLedger::new("Payer");
        ledger.script_errors(
            ACCUMULATOR_SCRIPT_KEY,
            [LedgerError::Other("insufficient funds".into())],
        );
        let err = AccumulatorProvisioner::new(&ledger)
            .with_activation_delay(Duration::ZERO)
            .provision(10, 32)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Rejected {
                what: "accumulator",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_create_registry() {
        let ledger = SimulatedLedger::new("Payer");
        let handle = RegistryInitializer::new(&ledger)
            .create_registry(&registry_name("Drop"))
            .await
            .unwrap();
        assert_eq!(handle.name, "Drop Collection");
        assert_eq!(handle.symbol, DEFAULT_SYMBOL);
        assert_eq!(handle.uri, DEFAULT_IMAGE_URI);
        assert!(handle.is_collection);
        assert_eq!(ledger.registry_is_collection(&handle.address), Some(true));
        assert_eq!(ledger.submissions()[0].operation, "create_registry");
    }

    #[test]
    fn test_supported_shapes() {
        assert!(is_supported_shape(14, 64));
        assert!(is_supported_shape(10, 32));
        assert!(!is_supported_shape(10, 64));
        assert_eq!(registry_name("  "), "Collection");
    }
}
