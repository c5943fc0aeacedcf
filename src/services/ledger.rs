// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process points ledger.
//!
//! Stands in for the external ledger/aggregation subsystem. The only
//! guarantee it needs to give the gateway is at-most-once crediting per
//! `(user, session)`, which it gets by checking and crediting under the same
//! map-entry lock.

use crate::models::{ActivityKind, CreditReceipt, PointsAccount};
use crate::time_utils::now_rfc3339;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared per-user points accounts.
#[derive(Clone, Default)]
pub struct PointsLedger {
    accounts: Arc<DashMap<String, PointsAccount>>,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `points` for a session, at most once.
    pub fn credit(
        &self,
        user_id: &str,
        session_id: &str,
        kind: ActivityKind,
        points: u32,
    ) -> CreditReceipt {
        let now = now_rfc3339();
        let mut account = self.accounts.entry(user_id.to_string()).or_default();
        let receipt = account.credit(session_id, kind, points, &now);

        if receipt.duplicate {
            tracing::debug!(user_id, session_id, "Session already credited (idempotent skip)");
        } else {
            tracing::info!(
                user_id,
                session_id,
                %kind,
                points,
                total = receipt.new_total_points,
                "Points credited"
            );
        }
        receipt
    }

    /// Snapshot of a user's account.
    pub fn account(&self, user_id: &str) -> Option<PointsAccount> {
        self.accounts.get(user_id).map(|a| a.clone())
    }

    pub fn total_points(&self, user_id: &str) -> u64 {
        self.accounts
            .get(user_id)
            .map(|a| a.total_points)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_total() {
        let ledger = PointsLedger::new();
        ledger.credit("alice", "s1", ActivityKind::Walk, 2);
        ledger.credit("alice", "s2", ActivityKind::Bike, 2);
        ledger.credit("bob", "s1", ActivityKind::Walk, 2);

        assert_eq!(ledger.total_points("alice"), 4);
        assert_eq!(ledger.total_points("bob"), 2);
        assert_eq!(ledger.total_points("carol"), 0);
        assert!(ledger.account("carol").is_none());
    }

    #[test]
    fn test_session_ids_scoped_per_user() {
        let ledger = PointsLedger::new();
        let a = ledger.credit("alice", "same", ActivityKind::Walk, 2);
        let b = ledger.credit("bob", "same", ActivityKind::Walk, 2);
        assert!(!a.duplicate);
        assert!(!b.duplicate);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_credit_once() {
        let ledger = PointsLedger::new();
        let mut handles = vec![];
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.credit("alice", "session-x", ActivityKind::Bike, 3)
            }));
        }

        let mut fresh = 0;
        for handle in handles {
            if !handle.await.expect("Task join failed").duplicate {
                fresh += 1;
            }
        }

        assert_eq!(fresh, 1);
        assert_eq!(ledger.total_points("alice"), 3);
    }
}
