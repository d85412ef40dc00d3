//! Differential set tracking between catalog snapshots.
//!
//! The persisted baseline is the only memory of which identifiers were
//! already seen. A run fetches details only for identifiers that are new
//! relative to it.

use std::collections::BTreeSet;

use crate::models::Identifier;

/// Identifiers added to and removed from the catalog since the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: BTreeSet<Identifier>,
    pub removed: BTreeSet<Identifier>,
}

impl SnapshotDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Added identifiers in fetch order (ascending).
    pub fn added_in_order(&self) -> Vec<Identifier> {
        self.added.iter().cloned().collect()
    }
}

/// What a run should do given the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffPlan {
    /// No baseline yet: persist the snapshot, fetch nothing, publish empty.
    FirstRun,
    /// Fetch and classify `diff.added`.
    Delta(SnapshotDiff),
}

/// Pure set difference between two snapshots.
pub fn calculate_diff(
    previous: &BTreeSet<Identifier>,
    current: &BTreeSet<Identifier>,
) -> SnapshotDiff {
    SnapshotDiff {
        added: current.difference(previous).cloned().collect(),
        removed: previous.difference(current).cloned().collect(),
    }
}

/// Decide between bootstrap and differential processing.
///
/// An empty baseline never triggers a full-catalog fetch.
pub fn plan(previous: &BTreeSet<Identifier>, current: &BTreeSet<Identifier>) -> DiffPlan {
    if previous.is_empty() {
        return DiffPlan::FirstRun;
    }
    DiffPlan::Delta(calculate_diff(previous, current))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<Identifier> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_no_changes() {
        let snapshot = set(&["A", "B"]);
        let diff = calculate_diff(&snapshot, &snapshot);
        assert!(!diff.has_changes());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn test_mixed_changes() {
        let diff = calculate_diff(&set(&["A", "B", "C"]), &set(&["A", "B", "D"]));
        assert_eq!(diff.added, set(&["D"]));
        assert_eq!(diff.removed, set(&["C"]));
    }

    #[test]
    fn test_added_in_order_is_sorted() {
        let diff = calculate_diff(&set(&["A"]), &set(&["Z", "A", "M", "B"]));
        assert_eq!(diff.added_in_order(), vec!["B", "M", "Z"]);
    }

    #[test]
    fn test_full_to_empty() {
        let diff = calculate_diff(&set(&["A"]), &set(&[]));
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed.len(), 1);
    }

    #[test]
    fn test_empty_baseline_is_first_run() {
        assert_eq!(plan(&set(&[]), &set(&["A", "B"])), DiffPlan::FirstRun);
    }

    #[test]
    fn test_repeated_plan_is_idempotent() {
        let previous = set(&["A", "B"]);
        let current = set(&["A", "B"]);
        for _ in 0..2 {
            assert_eq!(plan(&previous, &current), DiffPlan::Delta(SnapshotDiff::default()));
        }
    }
}
