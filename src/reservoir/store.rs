//! The ten reservoir indexes (spec.md §3), owned by one struct and mutated
//! only through the `Reservoir` wrapper's lock.

use rustc_hash::FxHashMap;
use std::time::SystemTime;

use crate::types::{
    IssueFreeData, IssuePaymentData, Owner, PayId, PaymentDetail, ShareId, TransactionData,
    TransactionPaymentData, TxId,
};

/// All state mutated under the reservoir's single read-write lock.
#[derive(Default)]
pub struct ReservoirState {
    pub pending_index: FxHashMap<TxId, PayId>,
    pub verified_index: FxHashMap<TxId, PayId>,

    pub pending_free_issues: FxHashMap<PayId, IssueFreeData>,
    pub pending_paid_issues: FxHashMap<PayId, IssuePaymentData>,
    pub pending_transactions: FxHashMap<PayId, TransactionPaymentData>,

    pub verified_free_issues: FxHashMap<PayId, IssueFreeData>,
    pub verified_paid_issues: FxHashMap<PayId, IssuePaymentData>,
    pub verified_transactions: FxHashMap<PayId, TransactionData>,

    pub orphan_payments: FxHashMap<PayId, PaymentDetail>,
    pub spend: FxHashMap<(Owner, ShareId), u64>,

    pub pending_free_count: usize,
    pub pending_paid_count: usize,
}

impl ReservoirState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invariant 1+5 (spec.md §3): every `pending_index` entry is backed by
    /// exactly one pending container, and the free/paid counters track the
    /// summed tx-list lengths. Checked only in debug builds, at the end of
    /// every mutating reservoir operation.
    #[cfg(debug_assertions)]
    pub fn debug_assert_invariants(&self) {
        let free_total: usize = self.pending_free_issues.values().map(|e| e.txs.len()).sum();
        debug_assert_eq!(free_total, self.pending_free_count);

        let paid_total: usize = self.pending_paid_issues.values().map(|e| e.txs.len()).sum::<usize>()
            + self.pending_transactions.len();
        debug_assert_eq!(paid_total, self.pending_paid_count);

        for (tx_id, pay_id) in &self.pending_index {
            let found = self
                .pending_free_issues
                .get(pay_id)
                .map(|e| e.txs.iter().any(|t| &t.tx_id == tx_id))
                .unwrap_or(false)
                || self
                    .pending_paid_issues
                    .get(pay_id)
                    .map(|e| e.txs.iter().any(|t| &t.tx_id == tx_id))
                    .unwrap_or(false)
                || self
                    .pending_transactions
                    .get(pay_id)
                    .map(|e| &e.tx.tx_id == tx_id)
                    .unwrap_or(false);
            debug_assert!(found, "pending_index entry {tx_id:?} has no backing container");
        }

        debug_assert!(
            self.pending_index.keys().all(|id| !self.verified_index.contains_key(id)),
            "tx_id present in both pending_index and verified_index"
        );
    }

    #[cfg(not(debug_assertions))]
    pub fn debug_assert_invariants(&self) {}

    /// Every entry whose `expires_at` is before `now`, across all five
    /// expiring containers, as `(container_tag, pay_id)` pairs. Used by the
    /// sweeper (spec.md §4.5) and by admission's pre-check (invariant 6).
    pub fn expired_pay_ids(&self, now: SystemTime, limit: usize) -> Vec<(Container, PayId)> {
        let mut out = Vec::new();
        for (id, e) in &self.pending_free_issues {
            if e.expires_at < now {
                out.push((Container::PendingFreeIssues, *id));
            }
        }
        for (id, e) in &self.pending_paid_issues {
            if e.expires_at < now {
                out.push((Container::PendingPaidIssues, *id));
            }
        }
        for (id, e) in &self.pending_transactions {
            if e.expires_at < now {
                out.push((Container::PendingTransactions, *id));
            }
        }
        out.truncate(limit);
        out
    }

    pub fn is_confirmed_or_verified(&self, tx_id: &TxId) -> bool {
        self.verified_index.contains_key(tx_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    PendingFreeIssues,
    PendingPaidIssues,
    PendingTransactions,
}
