//! Reconciliation item states
//!
//! Every reconcilable item (virtual host, domain, origin) carries one
//! of these states while a configuration snapshot is being applied.

/// Lifecycle state of a reconcilable configuration item
///
/// `Unknown -> New -> Applied` on first apply. On a fresh snapshot every
/// live item is first marked `NeedToCheck`, then transitions to
/// `NotChanged`, `Changed`, or `Delete`; after apply completes all
/// surviving items return to `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Not yet part of any reconcile
    Unknown,
    /// In sync with the last applied snapshot
    Applied,
    /// Awaiting comparison against the incoming snapshot
    NeedToCheck,
    /// Present in the snapshot and identical to live state
    NotChanged,
    /// Present in the snapshot but not yet applied
    New,
    /// Present in the snapshot with different values
    Changed,
    /// Absent from the snapshot; will be removed
    Delete,
}

impl ItemState {
    /// Whether this child state forces its parent host to be processed
    pub(crate) fn changes_parent(&self) -> bool {
        matches!(self, ItemState::New | ItemState::Changed | ItemState::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_parent() {
        assert!(ItemState::New.changes_parent());
        assert!(ItemState::Changed.changes_parent());
        assert!(ItemState::Delete.changes_parent());
        assert!(!ItemState::NotChanged.changes_parent());
        assert!(!ItemState::Applied.changes_parent());
    }
}
