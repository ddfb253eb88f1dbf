//! Expiry sweeper (spec.md §4.5): evicts anything past `expires_at`,
//! releasing its `pending_index` entries, counters, and `spend`
//! reservations. Processes at most `SWEEP_SLICE` entries per call so a
//! caller driving this on a periodic tick yields fairly rather than
//! holding the write lock for an unbounded sweep.

use std::time::SystemTime;

use super::store::Container;
use super::Reservoir;

const SWEEP_SLICE: usize = 256;

impl Reservoir {
    /// Evict every entry with `expires_at < now`, in bounded slices.
    /// Returns the number of pay-ids evicted this call.
    pub async fn evict_expired(&self, now: SystemTime) -> usize {
        let mut state = self.state.write().await;
        let expired = state.expired_pay_ids(now, SWEEP_SLICE);
        let count = expired.len();

        for (container, pay_id) in expired {
            match container {
                Container::PendingFreeIssues => {
                    if let Some(entry) = state.pending_free_issues.remove(&pay_id) {
                        for tx in &entry.txs {
                            state.pending_index.remove(&tx.tx_id);
                        }
                        state.pending_free_count -= entry.txs.len();
                    }
                }
                Container::PendingPaidIssues => {
                    if let Some(entry) = state.pending_paid_issues.remove(&pay_id) {
                        for tx in &entry.txs {
                            state.pending_index.remove(&tx.tx_id);
                        }
                        state.pending_paid_count -= entry.txs.len();
                    }
                }
                Container::PendingTransactions => {
                    if let Some(entry) = state.pending_transactions.remove(&pay_id) {
                        state.pending_index.remove(&entry.tx.tx_id);
                        state.pending_paid_count -= 1;
                        release_spend_if_reserved(&mut state, &entry);
                    }
                }
            }
        }

        state.debug_assert_invariants();
        count
    }
}

/// Releases a grant/swap's `spend` reservation(s) on eviction. Grants
/// carry one leg, swaps carry two (`owner`/`share_id_out` and
/// `counterparty`/`share_id_in`); everything else is a no-op.
fn release_spend_if_reserved(
    state: &mut super::ReservoirState,
    entry: &crate::types::TransactionPaymentData,
) {
    use crate::types::TransactionKind;

    let legs: Vec<(crate::types::Owner, crate::types::ShareId, u64)> = match &entry.tx.body {
        TransactionKind::ShareGrant(g) => vec![(g.owner, g.share_id, g.quantity)],
        TransactionKind::ShareSwap(s) => vec![
            (s.owner, s.share_id_out, s.quantity_out),
            (s.counterparty, s.share_id_in, s.quantity_in),
        ],
        _ => return,
    };

    for (owner, share_id, quantity) in legs {
        if let Some(reserved) = state.spend.get_mut(&(owner, share_id)) {
            *reserved = reserved.saturating_sub(quantity);
            if *reserved == 0 {
                state.spend.remove(&(owner, share_id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::testing::{build_test_reservoir, PAID_ASSET};
    use crate::types::Issue;

    use super::*;

    #[tokio::test]
    async fn evicted_entries_release_pending_index_and_counters() {
        let reservoir = build_test_reservoir();

        let batch = vec![Issue {
            owner: crate::types::Owner([3u8; 32]),
            asset_id: PAID_ASSET,
            nonce: 9,
        }];
        let (_info, _dup) = reservoir.store_issues(batch).await.unwrap();
        assert_eq!(reservoir.pending_paid_count().await, 1);

        let far_future = reservoir.clock.now() + Duration::from_secs(10_000_000);
        let evicted = reservoir.evict_expired(far_future).await;
        assert_eq!(evicted, 1);
        assert_eq!(reservoir.pending_paid_count().await, 0);

        let state = reservoir.state.read().await;
        assert!(state.pending_index.is_empty());
    }
}
