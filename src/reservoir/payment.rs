//! Payment reconciler: `accept_payment` (spec.md §4.4).

use crate::types::{acceptable_payment, PayId, PaymentDetail};

use super::Reservoir;

impl Reservoir {
    /// If `pay_id` is already pending somewhere and the delivered detail is
    /// acceptable, promote it straight to the matching verified container.
    /// Otherwise stash it in `orphanPayments` for the next admission with
    /// that pay-id to pick up (spec.md §4.4).
    pub async fn accept_payment(&self, pay_id: PayId, detail: PaymentDetail) {
        let mut state = self.state.write().await;

        if let Some(entry) = state.pending_paid_issues.get(&pay_id) {
            if acceptable_payment(&detail, &entry.payments) {
                let entry = state.pending_paid_issues.remove(&pay_id).expect("checked above");
                for tx in &entry.txs {
                    state.pending_index.remove(&tx.tx_id);
                    state.verified_index.insert(tx.tx_id, pay_id);
                }
                state.pending_paid_count -= entry.txs.len();
                state.verified_paid_issues.insert(pay_id, entry);
                state.debug_assert_invariants();
                return;
            }
        }

        if let Some(entry) = state.pending_transactions.get(&pay_id) {
            if acceptable_payment(&detail, &entry.payments) {
                let entry = state.pending_transactions.remove(&pay_id).expect("checked above");
                state.pending_index.remove(&entry.tx.tx_id);
                state.verified_index.insert(entry.tx.tx_id, pay_id);
                state.pending_paid_count -= 1;
                state.verified_transactions.insert(pay_id, entry.tx);
                state.debug_assert_invariants();
                return;
            }
        }

        state.orphan_payments.insert(pay_id, detail);
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::build_test_reservoir;
    use crate::types::{Issue, Owner, PaymentDetail};

    #[tokio::test]
    async fn orphan_payment_collapses_into_verification_on_next_admission() {
        let reservoir = build_test_reservoir();

        let batch = vec![Issue {
            owner: Owner([1u8; 32]),
            asset_id: crate::testing::PAID_ASSET,
            nonce: 7,
        }];

        let packed = reservoir
            .packer
            .pack(&crate::types::TransactionKind::Issue(batch[0].clone()));
        let pay_id = super::super::hash::compute_pay_id(&[packed]);

        let mut detail = PaymentDetail::new();
        detail.observe("BTC", "addr-1", 1_000);
        reservoir.accept_payment(pay_id, detail).await;

        let (_info, duplicate) = reservoir.store_issues(batch).await.unwrap();
        assert!(!duplicate);

        let state = reservoir.state.read().await;
        assert!(state.pending_paid_issues.is_empty());
        assert!(state.verified_paid_issues.contains_key(&pay_id));
    }
}
