//! Mint job description and per-item name derivation.

use serde::Serialize;
use thiserror::Error;

use crate::handles::{AccumulatorHandle, RegistryHandle};

/// Item names are capped at 32 bytes by the asset metadata standard.
pub const MAX_ITEM_NAME_LEN: usize = 32;

/// Width of the zero-padded index suffix.
pub const INDEX_WIDTH: usize = 6;

/// Longest prefix that still leaves room for a six-digit index suffix.
pub const MAX_NAME_PREFIX_LEN: usize = MAX_ITEM_NAME_LEN - INDEX_WIDTH;

/// Reasons a job is rejected before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("quantity must be at least 1")]
    EmptyQuantity,

    #[error("name prefix is {len} bytes; at most {max} bytes are allowed")]
    PrefixTooLong { len: usize, max: usize },

    #[error("quantity {quantity} exceeds accumulator capacity {capacity} (depth {depth})")]
    CapacityExceeded {
        quantity: u32,
        capacity: u64,
        depth: u32,
    },
}

/// Check a requested prefix/quantity against an accumulator of the given depth.
///
/// Called before provisioning (so nothing is paid for a job that cannot run)
/// and again by [`MintJob::new`].
pub fn validate_request(name_prefix: &str, quantity: u32, depth: u32) -> Result<(), JobError> {
    if quantity == 0 {
        return Err(JobError::EmptyQuantity);
    }
    // Indices past 999_999 widen the suffix beyond six digits.
    let max_prefix = MAX_ITEM_NAME_LEN.saturating_sub(index_width(quantity));
    if name_prefix.len() > max_prefix {
        return Err(JobError::PrefixTooLong {
            len: name_prefix.len(),
            max: max_prefix,
        });
    }
    let capacity = 1u64 << depth.min(63);
    if u64::from(quantity) > capacity {
        return Err(JobError::CapacityExceeded {
            quantity,
            capacity,
            depth,
        });
    }
    Ok(())
}

/// Digits used by the suffix of the largest index, never fewer than [`INDEX_WIDTH`].
fn index_width(quantity: u32) -> usize {
    (quantity.checked_ilog10().unwrap_or(0) as usize + 1).max(INDEX_WIDTH)
}

/// One item to mint: its 1-based index and derived name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDescriptor {
    pub index: u32,
    pub name: String,
}

impl ItemDescriptor {
    /// `prefix` followed by the index zero-padded to six digits.
    pub fn derive(prefix: &str, index: u32) -> Self {
        Self {
            index,
            name: format!("{}{:0width$}", prefix, index, width = INDEX_WIDTH),
        }
    }
}

/// A validated mint run. Immutable once built.
#[derive(Debug, Clone)]
pub struct MintJob {
    name_prefix: String,
    quantity: u32,
    accumulator: AccumulatorHandle,
    registry: Option<RegistryHandle>,
}

impl MintJob {
    pub fn new(
        name_prefix: impl Into<String>,
        quantity: u32,
        accumulator: AccumulatorHandle,
        registry: Option<RegistryHandle>,
    ) -> Result<Self, JobError> {
        let name_prefix = name_prefix.into();
        validate_request(&name_prefix, quantity, accumulator.max_depth)?;
        Ok(Self {
            name_prefix,
            quantity,
            accumulator,
            registry,
        })
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn accumulator(&self) -> &AccumulatorHandle {
        &self.accumulator
    }

    pub fn registry(&self) -> Option<&RegistryHandle> {
        self.registry.as_ref()
    }

    /// Items in index order `1..=quantity`.
    pub fn items(&self) -> impl Iterator<Item = ItemDescriptor> + '_ {
        (1..=self.quantity).map(move |i| ItemDescriptor::derive(&self.name_prefix, i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::Receipt;
    use std::collections::HashSet;

    fn accumulator(depth: u32) -> AccumulatorHandle {
        AccumulatorHandle {
            address: "tree".to_string(),
            max_depth: depth,
            max_buffer_size: 64,
            created_by: Receipt::new("sig"),
        }
    }

    #[test]
    fn test_derive_pads_to_six_digits() {
        assert_eq!(ItemDescriptor::derive("Test", 1).name, "Test000001");
        assert_eq!(ItemDescriptor::derive("Test", 123_456).name, "Test123456");
        assert_eq!(ItemDescriptor::derive("", 42).name, "000042");
    }

    #[test]
    fn test_item_names_are_unique() {
        let job = MintJob::new("Drop", 10_000, accumulator(14), None).unwrap();
        let names: HashSet<String> = job.items().map(|item| item.name).collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn test_items_are_in_index_order() {
        let job = MintJob::new("A", 5, accumulator(3), None).unwrap();
        let indices: Vec<u32> = job.items().map(|item| item.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rejects_empty_quantity() {
        let err = MintJob::new("A", 0, accumulator(14), None).unwrap_err();
        assert_eq!(err, JobError::EmptyQuantity);
    }

    #[test]
    fn test_rejects_long_prefix() {
        let prefix = "x".repeat(MAX_NAME_PREFIX_LEN + 1);
        let err = validate_request(&prefix, 1, 14).unwrap_err();
        assert!(matches!(err, JobError::PrefixTooLong { .. }));

        let prefix = "x".repeat(MAX_NAME_PREFIX_LEN);
        assert!(validate_request(&prefix, 1, 14).is_ok());
    }

    #[test]
    fn test_long_prefix_with_seven_digit_indices() {
        let prefix = "x".repeat(MAX_NAME_PREFIX_LEN);
        let err = validate_request(&prefix, 1_000_000, 20).unwrap_err();
        assert_eq!(
            err,
            JobError::PrefixTooLong {
                len: MAX_NAME_PREFIX_LEN,
                max: MAX_NAME_PREFIX_LEN - 1
            }
        );

        let prefix = "x".repeat(MAX_NAME_PREFIX_LEN - 1);
        let job = MintJob::new(prefix.as_str(), 1_000_000, accumulator(20), None).unwrap();
        let last = ItemDescriptor::derive(job.name_prefix(), job.quantity());
        assert_eq!(last.name.len(), MAX_ITEM_NAME_LEN);
        assert!(validate_request(&"x".repeat(MAX_NAME_PREFIX_LEN), 999_999, 20).is_ok());
    }

    #[test]
    fn test_rejects_quantity_over_capacity() {
        let err = validate_request("A", 1025, 10).unwrap_err();
        assert_eq!(
            err,
            JobError::CapacityExceeded {
                quantity: 1025,
                capacity: 1024,
                depth: 10
            }
        );
        assert!(validate_request("A", 1024, 10).is_ok());
    }
}
