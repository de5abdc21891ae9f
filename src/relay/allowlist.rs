//! Sponsorship Allow-List
//!
//! The relay forwards only operations addressed to known entry points.
//! Anything else is rejected before submission, so sponsored fees cannot be
//! burned on arbitrary destinations.

use std::collections::{BTreeMap, BTreeSet};

use crate::relay::protocol::RejectReason;

/// Escrow entry points the relay sponsors by default.
pub const ESCROW_SELECTORS: &[&str] = &[
    "create_game",
    "join_game",
    "authorize_session",
    "capture_piece",
    "end_game",
    "claim_timeout",
    "cancel_game",
];

/// Target -> allowed selectors.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl AllowList {
    /// Create an empty allow-list (rejects everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-list covering the escrow core's entry points on one target.
    pub fn escrow_default(target: &str) -> Self {
        let mut list = Self::new();
        for selector in ESCROW_SELECTORS {
            list.allow(target, selector);
        }
        list
    }

    /// Permit a selector on a target.
    pub fn allow(&mut self, target: &str, selector: &str) {
        self.entries
            .entry(target.to_string())
            .or_default()
            .insert(selector.to_string());
    }

    /// Check a bundle's destination before submission.
    pub fn check(&self, target: &str, selector: &str) -> Result<(), RejectReason> {
        let selectors = self
            .entries
            .get(target)
            .ok_or(RejectReason::TargetNotAllowed)?;
        if !selectors.contains(selector) {
            return Err(RejectReason::SelectorNotAllowed);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_default_allows_entry_points() {
        let list = AllowList::escrow_default("chess-escrow");
        for selector in ESCROW_SELECTORS {
            assert!(list.check("chess-escrow", selector).is_ok());
        }
    }

    #[test]
    fn test_unknown_target_rejected() {
        let list = AllowList::escrow_default("chess-escrow");
        assert_eq!(
            list.check("someone-elses-contract", "create_game"),
            Err(RejectReason::TargetNotAllowed)
        );
    }

    #[test]
    fn test_unknown_selector_rejected() {
        let list = AllowList::escrow_default("chess-escrow");
        assert_eq!(
            list.check("chess-escrow", "drain_funds"),
            Err(RejectReason::SelectorNotAllowed)
        );
    }

    #[test]
    fn test_empty_list_rejects_everything() {
        let list = AllowList::new();
        assert!(list.check("chess-escrow", "create_game").is_err());
    }
}
