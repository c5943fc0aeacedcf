//! Per-user points account held by the ledger.
//!
//! Credits are keyed by session identifier so that replaying a submission
//! never awards points twice.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::ActivityKind;

/// A single credited session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditedSession {
    pub kind: ActivityKind,
    pub points: u32,
    /// When the credit was applied (RFC3339)
    pub credited_at: String,
}

/// Points account for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointsAccount {
    // ─── Totals ──────────────────────────────────────────────────
    #[serde(default)]
    pub total_points: u64,
    /// Points per activity kind
    #[serde(default)]
    pub points_by_kind: HashMap<ActivityKind, u64>,

    // ─── Idempotency ─────────────────────────────────────────────
    /// Credited sessions by session id (for duplicate detection)
    #[serde(default)]
    pub sessions: HashMap<String, CreditedSession>,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(default)]
    pub updated_at: String,
}

/// Outcome of applying a credit to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditReceipt {
    /// Points attributed to this session (the original award on replay)
    pub awarded_points: u32,
    pub new_total_points: u64,
    /// True when the session had already been credited
    pub duplicate: bool,
}

impl PointsAccount {
    /// Credit a session at most once.
    pub fn credit(
        &mut self,
        session_id: &str,
        kind: ActivityKind,
        points: u32,
        now: &str,
    ) -> CreditReceipt {
        if let Some(existing) = self.sessions.get(session_id) {
            return CreditReceipt {
                awarded_points: existing.points,
                new_total_points: self.total_points,
                duplicate: true,
            };
        }

        self.sessions.insert(
            session_id.to_string(),
            CreditedSession {
                kind,
                points,
                credited_at: now.to_string(),
            },
        );
        self.total_points += u64::from(points);
        *self.points_by_kind.entry(kind).or_insert(0) += u64::from(points);
        self.updated_at = now.to_string();

        CreditReceipt {
            awarded_points: points,
            new_total_points: self.total_points,
            duplicate: false,
        }
    }
}
