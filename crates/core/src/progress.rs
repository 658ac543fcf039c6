//! Client-side aggregation of migration results.
//!
//! The client sends coupons in sequential batches. [`MigrationProgress`]
//! accumulates each batch's records, and supports retrying failed codes so
//! that a retried code's new outcome replaces its earlier error.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::coupon::CouponInput;
use crate::result::{BatchResult, CreatedRecord, DeletedRecord, ErrorRecord};

/// Running totals of a migration session.
#[derive(Debug, Clone, Default)]
pub struct MigrationProgress {
    processed: usize,
    total: usize,
    current_item: Option<String>,
    results: BatchResult,
}

/// Point-in-time view of a [`MigrationProgress`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub created: usize,
    pub deleted: usize,
    pub errors: usize,
    pub current_item: Option<String>,
    pub percent: f64,
}

impl MigrationProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Label the batch about to be sent.
    pub fn begin_batch(&mut self, label: impl Into<String>) {
        self.current_item = Some(label.into());
    }

    /// Record the result of a batch of `batch_len` items.
    pub fn apply_batch(&mut self, batch_len: usize, result: BatchResult) {
        self.results.merge(result);
        self.processed += batch_len;
        self.current_item = None;
    }

    /// Record the result of retrying `retried_codes`.
    ///
    /// Earlier errors for those codes are dropped; created and deleted
    /// records accumulate.
    pub fn apply_retry(&mut self, retried_codes: &[String], result: BatchResult) {
        let retried: HashSet<&str> = retried_codes.iter().map(String::as_str).collect();
        self.results
            .errors
            .retain(|e| !retried.contains(e.code.as_str()));
        self.results.merge(result);
        self.current_item = None;
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        #[allow(clippy::cast_precision_loss)]
        let percent = if self.total == 0 {
            100.0
        } else {
            (self.processed as f64 / self.total as f64 * 100.0).min(100.0)
        };

        ProgressSnapshot {
            processed: self.processed,
            total: self.total,
            created: self.results.created.len(),
            deleted: self.results.deleted.len(),
            errors: self.results.errors.len(),
            current_item: self.current_item.clone(),
            percent,
        }
    }

    #[must_use]
    pub fn created(&self) -> &[CreatedRecord] {
        &self.results.created
    }

    #[must_use]
    pub fn deleted(&self) -> &[DeletedRecord] {
        &self.results.deleted
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.results.errors
    }

    /// Errors worth retrying.
    #[must_use]
    pub fn retryable_errors(&self) -> Vec<&ErrorRecord> {
        self.results.errors.iter().filter(|e| e.retryable).collect()
    }

    /// Everything recorded so far.
    #[must_use]
    pub const fn results(&self) -> &BatchResult {
        &self.results
    }

    #[must_use]
    pub fn into_results(self) -> BatchResult {
        self.results
    }
}

/// Find the original items behind a set of failed codes.
///
/// Each code resolves to the first item with that code. Codes with no match
/// are ignored.
#[must_use]
pub fn select_for_retry(originals: &[CouponInput], failed: &[&ErrorRecord]) -> Vec<CouponInput> {
    let mut by_code: HashMap<String, &CouponInput> = HashMap::new();
    for item in originals {
        by_code.entry(item.code()).or_insert(item);
    }

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for error in failed {
        if !seen.insert(error.code.clone()) {
            continue;
        }
        if let Some(item) = by_code.get(&error.code) {
            selected.push((*item).clone());
        }
    }
    selected
}

/// Codes that appear more than once, in order of first repeat.
#[must_use]
pub fn duplicate_codes(items: &[CouponInput]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for item in items {
        if let CouponInput::Coupon(coupon) = item {
            if !seen.insert(coupon.code.as_str()) && reported.insert(coupon.code.as_str()) {
                duplicates.push(coupon.code.clone());
            }
        }
    }
    duplicates
}
