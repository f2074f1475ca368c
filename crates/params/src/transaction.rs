//! Set-value transactions
//!
//! A single incoming request may touch the same array several times (for
//! example two appends to `/names/-`). Length budgets must therefore be
//! checked against the *pending* state of the array, not its committed
//! state. [`SetValueTransaction`] holds one [`SizeTracker`] per array oid:
//!
//! - trackers are created lazily from the current value on first touch
//! - a check that fails leaves the tracker unchanged
//! - the owner resets the transaction between independent requests
//!
//! The transaction is owned by the top-level caller and passed explicitly to
//! every check; nothing here is global.

use rustc_hash::FxHashMap;

/// Pending size of one array
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeTracker {
    /// Pending element count
    pub count: usize,
    /// Pending per-element string lengths, for string arrays only
    pub lengths: Option<Vec<usize>>,
}

impl SizeTracker {
    /// Tracker for a plain array
    pub fn counted(count: usize) -> Self {
        SizeTracker {
            count,
            lengths: None,
        }
    }

    /// Tracker for a string array
    pub fn with_lengths(lengths: Vec<usize>) -> Self {
        SizeTracker {
            count: lengths.len(),
            lengths: Some(lengths),
        }
    }

    /// Sum of the tracked string lengths
    pub fn total_length(&self) -> usize {
        self.lengths.as_ref().map(|l| l.iter().sum()).unwrap_or(0)
    }
}

/// Size trackers of one validate-then-commit sequence
#[derive(Debug, Default)]
pub struct SetValueTransaction {
    trackers: FxHashMap<String, SizeTracker>,
}

impl SetValueTransaction {
    /// Fresh transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker for `oid`, if touched
    pub fn tracker(&self, oid: &str) -> Option<&SizeTracker> {
        self.trackers.get(oid)
    }

    /// Copy of the tracker for `oid`, initialized by `init` on first touch
    pub(crate) fn pending(&self, oid: &str, init: impl FnOnce() -> SizeTracker) -> SizeTracker {
        self.trackers.get(oid).cloned().unwrap_or_else(init)
    }

    /// Record the accepted state of `oid`
    pub(crate) fn commit(&mut self, oid: &str, tracker: SizeTracker) {
        self.trackers.insert(oid.to_string(), tracker);
    }

    /// Drop the tracker of `oid` and of everything below it
    pub fn forget_subtree(&mut self, oid: &str) {
        let prefix = format!("{}/", oid);
        self.trackers
            .retain(|k, _| k != oid && !k.starts_with(&prefix));
    }

    /// Drop every tracker
    pub fn reset(&mut self) {
        self.trackers.clear();
    }

    /// Number of touched arrays
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// True when nothing has been touched
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
