//! In-process ledger and indexer.
//!
//! [`SimulatedLedger`] implements both [`LedgerClient`] and [`AssetIndex`]
//! without a network. It models the behaviors the minting core has to cope
//! with on a real cluster:
//!
//! - accumulators and registries only accept mints after an activation lag
//! - every N-th submission can be rejected as rate limited
//! - per-key scripted error sequences (item name, registry name, or `"accumulator"`)
//! - receipts whose item identity never resolves
//! - indexer visibility that trails submission by a configurable lag
//!
//! Receipts and addresses are derived deterministically from the submission
//! counter, so two runs with the same inputs produce the same identifiers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use minter_types::encoding::base58_encode;
use minter_types::{ItemId, Receipt};
use parking_lot::Mutex;
use sha2::{Digest, Sha256, Sha512};
use tokio::time::Instant;
use tracing::debug;

use crate::ledger::{
    Asset, AssetIndex, LedgerClient, LedgerError, Operation, SubmitMode, Submitted,
};

/// Script key for accumulator creation.
pub const ACCUMULATOR_SCRIPT_KEY: &str = "accumulator";

/// One entry in the submission log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionLogEntry {
    pub sequence: u64,
    pub operation: &'static str,
    /// Item name, registry name, or [`ACCUMULATOR_SCRIPT_KEY`].
    pub key: String,
    pub mode: SubmitMode,
    pub accepted: bool,
}

#[derive(Debug)]
struct AccumulatorState {
    capacity: u64,
    leaves: u64,
    active_at: Instant,
}

#[derive(Debug)]
struct IndexedItem {
    asset: Asset,
    sequence: u64,
    visible_at: Instant,
}

#[derive(Debug)]
struct RegistryState {
    active_at: Instant,
    is_collection: bool,
}

#[derive(Debug, Default)]
struct State {
    sequence: u64,
    accumulators: HashMap<String, AccumulatorState>,
    registries: HashMap<String, RegistryState>,
    receipts: HashMap<Receipt, ItemId>,
    items: HashMap<ItemId, IndexedItem>,
    scripted: HashMap<String, VecDeque<LedgerError>>,
    unresolvable: HashSet<String>,
    log: Vec<SubmissionLogEntry>,
}

/// Deterministic stand-in for a cluster plus its DAS indexer.
#[derive(Debug)]
pub struct SimulatedLedger {
    payer: String,
    activation_lag: Duration,
    index_lag: Duration,
    rate_limit_every: Option<u64>,
    submit_latency: Duration,
    confirm_latency: Duration,
    state: Mutex<State>,
}

impl SimulatedLedger {
    pub fn new(payer: impl Into<String>) -> Self {
        Self {
            payer: payer.into(),
            activation_lag: Duration::ZERO,
            index_lag: Duration::ZERO,
            rate_limit_every: None,
            submit_latency: Duration::ZERO,
            confirm_latency: Duration::ZERO,
            state: Mutex::new(State::default()),
        }
    }

    /// Accounts created by this ledger reject mints until `lag` has elapsed.
    pub fn with_activation_lag(mut self, lag: Duration) -> Self {
        self.activation_lag = lag;
        self
    }

    /// Minted items become visible to the indexer only after `lag`.
    pub fn with_index_lag(mut self, lag: Duration) -> Self {
        self.index_lag = lag;
        self
    }

    /// Reject every `n`-th submission as rate limited. `0` disables.
    pub fn with_rate_limit_every(mut self, n: u64) -> Self {
        self.rate_limit_every = (n > 0).then_some(n);
        self
    }

    /// Simulated network latency for a send and the extra wait for confirmation.
    pub fn with_latency(mut self, submit: Duration, confirm: Duration) -> Self {
        self.submit_latency = submit;
        self.confirm_latency = confirm;
        self
    }

    /// Queue errors returned, in order, by the next submissions for `key`.
    pub fn script_errors(&self, key: impl Into<String>, errors: impl IntoIterator<Item = LedgerError>) {
        self.state
            .lock()
            .scripted
            .entry(key.into())
            .or_default()
            .extend(errors);
    }

    /// The receipt for the item named `name` will never resolve to an identity.
    pub fn fail_resolution_for(&self, name: impl Into<String>) {
        self.state.lock().unresolvable.insert(name.into());
    }

    pub fn submissions(&self) -> Vec<SubmissionLogEntry> {
        self.state.lock().log.clone()
    }

    /// Number of submission calls received, accepted or not.
    pub fn submission_count(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Leaves appended to the accumulator at `address`.
    pub fn leaf_count(&self, address: &str) -> Option<u64> {
        self.state.lock().accumulators.get(address).map(|a| a.leaves)
    }

    /// Whether the registry at `address` was created with the collection flag.
    pub fn registry_is_collection(&self, address: &str) -> Option<bool> {
        self.state
            .lock()
            .registries
            .get(address)
            .map(|r| r.is_collection)
    }

    fn execute(&self, operation: &Operation, mode: SubmitMode) -> Result<Submitted, LedgerError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.sequence += 1;
        let sequence = state.sequence;
        let key = script_key(operation);

        let result = self.apply(&mut state, operation, sequence, now);
        state.log.push(SubmissionLogEntry {
            sequence,
            operation: operation.label(),
            key: key.clone(),
            mode,
            accepted: result.is_ok(),
        });
        debug!(
            sequence,
            op = operation.label(),
            key = %key,
            accepted = result.is_ok(),
            "simulated submission"
        );
        result
    }

    fn apply(
        &self,
        state: &mut State,
        operation: &Operation,
        sequence: u64,
        now: Instant,
    ) -> Result<Submitted, LedgerError> {
        let key = script_key(operation);
        if let Some(err) = state.scripted.get_mut(&key).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if let Some(n) = self.rate_limit_every {
            if sequence % n == 0 {
                return Err(LedgerError::RateLimited(format!(
                    "429 Too Many Requests (submission {})",
                    sequence
                )));
            }
        }

        let receipt = Receipt::new(derive_signature(sequence, &key));
        match operation {
            Operation::CreateAccumulator { max_depth, .. } => {
                let address = derive_address("accumulator", sequence);
                state.accumulators.insert(
                    address.clone(),
                    AccumulatorState {
                        capacity: 1u64 << (*max_depth).min(63),
                        leaves: 0,
                        active_at: now + self.activation_lag,
                    },
                );
                Ok(Submitted {
                    receipt,
                    created: Some(address),
                })
            }
            Operation::CreateRegistry { metadata } => {
                let address = derive_address("registry", sequence);
                state.registries.insert(
                    address.clone(),
                    RegistryState {
                        active_at: now + self.activation_lag,
                        is_collection: metadata.is_collection,
                    },
                );
                Ok(Submitted {
                    receipt,
                    created: Some(address),
                })
            }
            Operation::MintItem {
                accumulator,
                registry,
                owner,
                metadata,
            } => {
                if let Some(registry) = registry {
                    match state.registries.get(registry) {
                        None => {
                            return Err(LedgerError::Other(format!(
                                "registry {} does not exist",
                                registry
                            )))
                        }
                        Some(r) if !r.is_collection => {
                            return Err(LedgerError::Other(format!(
                                "registry {} is not a collection",
                                registry
                            )))
                        }
                        Some(r) if now < r.active_at => {
                            return Err(LedgerError::NotYetActive(format!(
                                "registry {} is not initialized",
                                registry
                            )))
                        }
                        Some(_) => {}
                    }
                }

                let tree = state.accumulators.get_mut(accumulator).ok_or_else(|| {
                    LedgerError::Other(format!("accumulator {} does not exist", accumulator))
                })?;
                if now < tree.active_at {
                    return Err(LedgerError::NotYetActive(format!(
                        "accumulator {} is not initialized",
                        accumulator
                    )));
                }
                if tree.leaves >= tree.capacity {
                    return Err(LedgerError::Other(format!(
                        "accumulator {} is full ({} leaves)",
                        accumulator, tree.capacity
                    )));
                }
                let leaf_index = tree.leaves;
                tree.leaves += 1;

                let id = ItemId::new(derive_address(
                    &format!("{}:{}", accumulator, leaf_index),
                    sequence,
                ));
                state.receipts.insert(receipt.clone(), id.clone());
                state.items.insert(
                    id.clone(),
                    IndexedItem {
                        asset: Asset {
                            id,
                            name: Some(metadata.name.clone()),
                            owner: Some(owner.clone()),
                            collection: registry.clone(),
                        },
                        sequence,
                        visible_at: now + self.index_lag,
                    },
                );
                Ok(Submitted {
                    receipt,
                    created: None,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl LedgerClient for SimulatedLedger {
    fn payer(&self) -> &str {
        &self.payer
    }

    async fn submit(
        &self,
        operation: &Operation,
        mode: SubmitMode,
    ) -> Result<Submitted, LedgerError> {
        if !self.submit_latency.is_zero() {
            tokio::time::sleep(self.submit_latency).await;
        }
        let result = self.execute(operation, mode);
        if result.is_ok() && mode == SubmitMode::Confirmed && !self.confirm_latency.is_zero() {
            tokio::time::sleep(self.confirm_latency).await;
        }
        result
    }

    async fn resolve_item_identity(&self, receipt: &Receipt) -> Result<ItemId, LedgerError> {
        let state = self.state.lock();
        let id = state
            .receipts
            .get(receipt)
            .ok_or_else(|| LedgerError::Other(format!("transaction {} not found", receipt)))?;
        let unresolvable = state
            .items
            .get(id)
            .and_then(|item| item.asset.name.as_ref())
            .is_some_and(|name| state.unresolvable.contains(name));
        if unresolvable {
            return Err(LedgerError::Other(format!(
                "no leaf event in transaction {}",
                receipt
            )));
        }
        Ok(id.clone())
    }
}

#[async_trait::async_trait]
impl AssetIndex for SimulatedLedger {
    async fn query_metadata(&self, id: &ItemId) -> Result<Asset, LedgerError> {
        let now = Instant::now();
        let state = self.state.lock();
        match state.items.get(id) {
            Some(item) if now >= item.visible_at => Ok(item.asset.clone()),
            _ => Err(LedgerError::Other(format!("asset {} not found", id))),
        }
    }

    async fn query_items_by_owner(
        &self,
        owner: &str,
        collection: Option<&str>,
    ) -> Result<Vec<Asset>, LedgerError> {
        let now = Instant::now();
        let state = self.state.lock();
        let mut matches: Vec<&IndexedItem> = state
            .items
            .values()
            .filter(|item| now >= item.visible_at)
            .filter(|item| item.asset.owner.as_deref() == Some(owner))
            .filter(|item| {
                collection.map_or(true, |c| item.asset.collection.as_deref() == Some(c))
            })
            .collect();
        matches.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(matches.into_iter().map(|item| item.asset.clone()).collect())
    }
}

fn script_key(operation: &Operation) -> String {
    match operation {
        Operation::CreateAccumulator { .. } => ACCUMULATOR_SCRIPT_KEY.to_string(),
        Operation::CreateRegistry { metadata } => metadata.name.clone(),
        Operation::MintItem { metadata, .. } => metadata.name.clone(),
    }
}

/// 64-byte signature-shaped receipt.
fn derive_signature(sequence: u64, key: &str) -> String {
    let digest = Sha512::digest(format!("sig:{}:{}", sequence, key).as_bytes());
    base58_encode(&digest)
}

/// 32-byte address.
fn derive_address(domain: &str, sequence: u64) -> String {
    let digest = Sha256::digest(format!("{}:{}", domain, sequence).as_bytes());
    base58_encode(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ItemMetadata, RegistryMetadata};

    fn mint_op(accumulator: &str, registry: Option<&str>, name: &str) -> Operation {
        Operation::MintItem {
            accumulator: accumulator.to_string(),
            registry: registry.map(str::to_string),
            owner: "Owner111".to_string(),
            metadata: ItemMetadata {
                name: name.to_string(),
                symbol: "CNFT".to_string(),
                uri: "https://example.com/a.png".to_string(),
                seller_fee_basis_points: 0,
                creators: vec![],
            },
        }
    }

    async fn create_tree(ledger: &SimulatedLedger, depth: u32) -> String {
        ledger
            .submit(
                &Operation::CreateAccumulator {
                    max_depth: depth,
                    max_buffer_size: 8,
                },
                SubmitMode::Confirmed,
            )
            .await
            .unwrap()
            .created
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mint_rejected_until_active() {
        let ledger = SimulatedLedger::new("Payer").with_activation_lag(Duration::from_secs(3));
        let tree = create_tree(&ledger, 3).await;

        let err = ledger
            .submit(&mint_op(&tree, None, "A000001"), SubmitMode::FireAndForget)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotYetActive(_)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(ledger
            .submit(&mint_op(&tree, None, "A000001"), SubmitMode::FireAndForget)
            .await
            .is_ok());
        assert_eq!(ledger.leaf_count(&tree), Some(1));
    }

    #[tokio::test]
    async fn test_scripted_errors_are_consumed_in_order() {
        let ledger = SimulatedLedger::new("Payer");
        let tree = create_tree(&ledger, 3).await;
        ledger.script_errors(
            "A000002",
            [
                LedgerError::RateLimited("429".into()),
                LedgerError::Other("boom".into()),
            ],
        );
        let op = mint_op(&tree, None, "A000002");
        assert!(matches!(
            ledger.submit(&op, SubmitMode::FireAndForget).await,
            Err(LedgerError::RateLimited(_))
        ));
        assert!(matches!(
            ledger.submit(&op, SubmitMode::Confirmed).await,
            Err(LedgerError::Other(_))
        ));
        assert!(ledger.submit(&op, SubmitMode::FireAndForget).await.is_ok());

        let log = ledger.submissions();
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].mode, SubmitMode::Confirmed);
        assert!(!log[2].accepted);
    }

    #[tokio::test]
    async fn test_rate_limit_every() {
        let ledger = SimulatedLedger::new("Payer").with_rate_limit_every(2);
        let tree = create_tree(&ledger, 3).await;
        let err = ledger
            .submit(&mint_op(&tree, None, "A000001"), SubmitMode::FireAndForget)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ledger::ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let ledger = SimulatedLedger::new("Payer");
        let tree = create_tree(&ledger, 1).await;
        for name in ["A1", "A2"] {
            ledger
                .submit(&mint_op(&tree, None, name), SubmitMode::FireAndForget)
                .await
                .unwrap();
        }
        let err = ledger
            .submit(&mint_op(&tree, None, "A3"), SubmitMode::FireAndForget)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("full"));
    }

    #[tokio::test]
    async fn test_resolution_and_indexing() {
        let ledger = SimulatedLedger::new("Payer");
        let tree = create_tree(&ledger, 3).await;
        let registry = ledger
            .submit(
                &Operation::CreateRegistry {
                    metadata: RegistryMetadata {
                        name: "A Collection".into(),
                        symbol: "CNFT".into(),
                        uri: "https://example.com/a.png".into(),
                        seller_fee_basis_points: 0,
                        is_collection: true,
                    },
                },
                SubmitMode::Confirmed,
            )
            .await
            .unwrap()
            .created
            .unwrap();

        ledger.fail_resolution_for("A000002");
        let first = ledger
            .submit(&mint_op(&tree, Some(&registry), "A000001"), SubmitMode::FireAndForget)
            .await
            .unwrap();
        let second = ledger
            .submit(&mint_op(&tree, Some(&registry), "A000002"), SubmitMode::FireAndForget)
            .await
            .unwrap();

        let id = ledger.resolve_item_identity(&first.receipt).await.unwrap();
        let asset = ledger.query_metadata(&id).await.unwrap();
        assert_eq!(asset.name.as_deref(), Some("A000001"));
        assert!(ledger.resolve_item_identity(&second.receipt).await.is_err());

        let owned = ledger
            .query_items_by_owner("Owner111", Some(&registry))
            .await
            .unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].name.as_deref(), Some("A000002"));
        assert!(ledger
            .query_items_by_owner("Owner111", Some("Other"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_grouping_requires_collection_registry() {
        let ledger = SimulatedLedger::new("Payer");
        let tree = create_tree(&ledger, 3).await;
        let plain = ledger
            .submit(
                &Operation::CreateRegistry {
                    metadata: RegistryMetadata {
                        name: "Plain".into(),
                        symbol: "CNFT".into(),
                        uri: "https://example.com/a.png".into(),
                        seller_fee_basis_points: 0,
                        is_collection: false,
                    },
                },
                SubmitMode::Confirmed,
            )
            .await
            .unwrap()
            .created
            .unwrap();
        assert_eq!(ledger.registry_is_collection(&plain), Some(false));

        let err = ledger
            .submit(&mint_op(&tree, Some(&plain), "A000001"), SubmitMode::Confirmed)
            .await
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("not a collection"));
        assert_eq!(ledger.leaf_count(&tree), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_lag_hides_fresh_items() {
        let ledger = SimulatedLedger::new("Payer").with_index_lag(Duration::from_secs(2));
        let tree = create_tree(&ledger, 3).await;
        let sent = ledger
            .submit(&mint_op(&tree, None, "A000001"), SubmitMode::FireAndForget)
            .await
            .unwrap();
        let id = ledger.resolve_item_identity(&sent.receipt).await.unwrap();
        assert!(ledger.query_metadata(&id).await.is_err());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(ledger.query_metadata(&id).await.is_ok());
    }

    #[test]
    fn test_derived_ids_are_deterministic() {
        assert_eq!(derive_signature(1, "a"), derive_signature(1, "a"));
        assert_ne!(derive_signature(1, "a"), derive_signature(2, "a"));
        assert_eq!(
            bs58::decode(derive_address("x", 1)).into_vec().unwrap().len(),
            32
        );
    }
}
