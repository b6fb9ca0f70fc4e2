//! Results produced by a mint run.

use serde::{Deserialize, Serialize};

use crate::handles::{ItemId, Receipt};

/// How far a single item's submission got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Accepted by the fire-and-forget send; confirmation was not awaited.
    Sent,
    /// Accepted by the confirmed fallback submission.
    Confirmed,
    /// Every allowed round failed.
    Failed,
}

impl SubmissionStatus {
    pub fn is_success(self) -> bool {
        !matches!(self, SubmissionStatus::Failed)
    }
}

/// Record of one item's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub index: u32,
    pub name: String,
    pub status: SubmissionStatus,
    pub receipt: Option<Receipt>,
    /// Submission rounds used (a round is the primary send plus its optional fallback).
    pub attempts: u32,
    /// Message of the last error seen, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }
}

/// Live `current / total` counter, only ever advanced by the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub current: u32,
    pub total: u32,
}

impl ProgressState {
    pub fn new(total: u32) -> Self {
        Self { current: 0, total }
    }

    /// Count one more successful item. Never exceeds `total`.
    pub fn advance(&mut self) {
        if self.current < self.total {
            self.current += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }

    /// Completion ratio in `[0, 1]`; an empty job counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::from(self.current) / f64::from(self.total)
    }
}

/// What a verification record refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VerificationSubject {
    /// Identity could not be resolved; only the receipt is known.
    Receipt(Receipt),
    /// Identity was resolved from the receipt.
    Item(ItemId),
}

/// Cross-check of one submitted item against the indexing service.
///
/// `verified == false` is a valid terminal state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub subject: VerificationSubject,
    pub expected_name: String,
    /// Name reported by the indexer; `None` when unknown.
    pub resolved_name: Option<String>,
    pub verified: bool,
}

impl VerificationRecord {
    pub fn unresolved(receipt: Receipt, expected_name: impl Into<String>) -> Self {
        Self {
            subject: VerificationSubject::Receipt(receipt),
            expected_name: expected_name.into(),
            resolved_name: None,
            verified: false,
        }
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        match &self.subject {
            VerificationSubject::Item(id) => Some(id),
            VerificationSubject::Receipt(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_exceeds_total() {
        let mut progress = ProgressState::new(2);
        progress.advance();
        progress.advance();
        progress.advance();
        assert_eq!(progress.current, 2);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_fraction() {
        let mut progress = ProgressState::new(4);
        progress.advance();
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);
        assert!((ProgressState::new(0).fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SubmissionStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }

    #[test]
    fn test_unresolved_record() {
        let record = VerificationRecord::unresolved(Receipt::new("sig"), "Test000001");
        assert!(!record.verified);
        assert!(record.item_id().is_none());
        assert!(record.resolved_name.is_none());
    }
}
