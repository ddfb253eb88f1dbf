//! Per-kind admission pipeline (spec.md §4.1, §4.2).

use crate::error::{CapacityError, ConflictError, ReservoirResult, ValidationError};
use crate::types::{
    acceptable_payment, scale_payments, AssetId, Issue, IssueFreeData, IssuePaymentData, Owner,
    PayId, PayNonce, PaymentAlternative, ShareGrant, ShareId, ShareSwap, TransactionData,
    TransactionKind, TransactionPaymentData, TransferCountersigned, TransferUnratified, TxId,
};

use super::difficulty::scaled_difficulty;
use super::hash::compute_pay_id;
use super::{GrantInfo, IssueInfo, Reservoir, SwapInfo, TransferInfo};

/// Classification of an issue batch before a `pay_id` is computed.
enum IssueClass {
    Free,
    Paid { asset_id: AssetId },
}

impl Reservoir {
    /// Genesis-equivalent floor: a confirmed asset must have been issued
    /// strictly after this block for the paid path to quote a payment.
    const GENESIS_BLOCK_NUMBER: u64 = 0;

    /// spec.md §4.1/§4.2: admit a batch of issues, classifying the whole
    /// batch as free (every nonce zero) or paid.
    pub async fn store_issues(&self, batch: Vec<Issue>) -> ReservoirResult<(IssueInfo, bool)> {
        let max = self.config.maximum_issues_per_request;
        if batch.is_empty() {
            return Err(ValidationError::MissingParameters.into());
        }
        if batch.len() > max {
            return Err(CapacityError::TooManyItemsToProcess.into());
        }

        let mut packed_bodies = Vec::with_capacity(batch.len());
        let mut tx_ids = Vec::with_capacity(batch.len());
        let mut duplicate_seen = false;
        let mut unique_asset = true;
        let mut free_allowed = true;
        let first_asset = batch[0].asset_id;

        for issue in &batch {
            if !self.network.owner_matches_network(&issue.owner) {
                return Err(ValidationError::WrongNetworkForPublicKey.into());
            }
            if issue.nonce != 0 {
                free_allowed = false;
            }
            if issue.asset_id != first_asset {
                unique_asset = false;
            }
            if !self.asset_store.asset_exists(&issue.asset_id) {
                return Err(ConflictError::AssetNotFound.into());
            }

            let kind = TransactionKind::Issue(issue.clone());
            let packed = self.packer.pack(&kind);
            let tx_id = self.packer.make_link(&packed);

            {
                let state = self.state.read().await;
                if self.block_store.has(&tx_id) || state.is_confirmed_or_verified(&tx_id) {
                    return Err(ConflictError::TransactionAlreadyExists.into());
                }
                if state.pending_index.contains_key(&tx_id) {
                    duplicate_seen = true;
                }
            }

            tx_ids.push(tx_id);
            packed_bodies.push(packed);
        }

        let pay_id = compute_pay_id(&packed_bodies);
        let packed_all: Vec<u8> = packed_bodies.iter().flatten().copied().collect();

        let class = if free_allowed {
            IssueClass::Free
        } else {
            if !unique_asset {
                return Err(ConflictError::AssetNotFound.into());
            }
            IssueClass::Paid { asset_id: first_asset }
        };

        let mut state = self.state.write().await;

        if let Some(entry) = state.pending_free_issues.get(&pay_id) {
            return Ok((
                IssueInfo {
                    tx_ids,
                    packed: packed_all,
                    pay_id,
                    nonce: Some(entry.nonce),
                    difficulty: Some(entry.difficulty),
                    payments: None,
                },
                true,
            ));
        }
        if let Some(entry) = state.pending_paid_issues.get(&pay_id) {
            return Ok((
                IssueInfo {
                    tx_ids,
                    packed: packed_all,
                    pay_id,
                    nonce: None,
                    difficulty: None,
                    payments: Some(entry.payments.clone()),
                },
                true,
            ));
        }

        if duplicate_seen {
            return Err(ConflictError::TransactionAlreadyExists.into());
        }

        let txs: Vec<TransactionData> = batch
            .iter()
            .zip(tx_ids.iter())
            .zip(packed_bodies.iter())
            .map(|((issue, tx_id), packed)| TransactionData {
                tx_id: *tx_id,
                body: TransactionKind::Issue(issue.clone()),
                packed_bytes: packed.clone(),
            })
            .collect();

        let now = self.clock.now();
        let expires_at = now + self.config.reservoir_timeout;

        match class {
            IssueClass::Free => {
                let nonce = new_pay_nonce(self.block_store.as_ref());
                let difficulty = scaled_difficulty(batch.len());

                let entry = IssueFreeData {
                    pay_id,
                    txs,
                    nonce,
                    client_nonce: None,
                    difficulty,
                    asset_id: first_asset,
                    expires_at,
                };

                if state.pending_free_count + entry.txs.len() > self.config.maximum_pending_free_issues {
                    return Err(CapacityError::BufferCapacityLimit.into());
                }

                for tx_id in &tx_ids {
                    state.pending_index.insert(*tx_id, pay_id);
                }
                state.pending_free_count += entry.txs.len();
                state.pending_free_issues.insert(pay_id, entry);

                state.debug_assert_invariants();

                Ok((
                    IssueInfo {
                        tx_ids,
                        packed: packed_all,
                        pay_id,
                        nonce: Some(nonce),
                        difficulty: Some(difficulty),
                        payments: None,
                    },
                    false,
                ))
            }
            IssueClass::Paid { asset_id } => {
                let asset_block_number = self
                    .asset_store
                    .asset_block_number(&asset_id)
                    .filter(|n| *n > Self::GENESIS_BLOCK_NUMBER)
                    .ok_or(ConflictError::AssetNotFound)?;

                let base_payments = self.payment_store.payments_for_block(asset_block_number);
                let payments = scale_payments(&base_payments, batch.len() as u64);

                let entry = IssuePaymentData {
                    pay_id,
                    txs,
                    payments: payments.clone(),
                    expires_at,
                };

                if let Some((info, duplicate)) = self.try_auto_verify_issue(&mut state, &entry, &tx_ids) {
                    return Ok((info, duplicate));
                }

                if state.pending_paid_count + entry.txs.len() >= self.config.maximum_pending_paid_issues {
                    return Err(CapacityError::BufferCapacityLimit.into());
                }

                for tx_id in &tx_ids {
                    state.pending_index.insert(*tx_id, pay_id);
                }
                state.pending_paid_count += entry.txs.len();
                state.pending_paid_issues.insert(pay_id, entry);

                state.debug_assert_invariants();

                Ok((
                    IssueInfo {
                        tx_ids,
                        packed: packed_all,
                        pay_id,
                        nonce: None,
                        difficulty: None,
                        payments: Some(payments),
                    },
                    false,
                ))
            }
        }
    }

    /// Orphan-first, then auto-verify (spec.md §9 Open Question (a), per
    /// `original_source/reservoir/issues.go`).
    fn try_auto_verify_issue(
        &self,
        state: &mut tokio::sync::RwLockWriteGuard<'_, super::ReservoirState>,
        entry: &IssuePaymentData,
        tx_ids: &[TxId],
    ) -> Option<(IssueInfo, bool)> {
        let detail = state.orphan_payments.get(&entry.pay_id).cloned();
        let should_check = detail.is_some() || self.config.auto_verify;
        if !should_check {
            return None;
        }
        let detail = detail.unwrap_or_default();
        if !acceptable_payment(&detail, &entry.payments) {
            return None;
        }

        for tx_id in tx_ids {
            state.verified_index.insert(*tx_id, entry.pay_id);
        }
        state.verified_paid_issues.insert(entry.pay_id, entry.clone());
        state.orphan_payments.remove(&entry.pay_id);

        Some((
            IssueInfo {
                tx_ids: tx_ids.to_vec(),
                packed: entry.txs.iter().flat_map(|t| t.packed_bytes.clone()).collect(),
                pay_id: entry.pay_id,
                nonce: None,
                difficulty: None,
                payments: Some(entry.payments.clone()),
            },
            false,
        ))
    }

    /// spec.md §4.2 "Transfer (unratified)": verify the prior-link
    /// signature and ownership routing, reject dust transfers to a zero
    /// destination when double-signed.
    pub async fn store_transfer(
        &self,
        transfer: TransferRequest,
    ) -> ReservoirResult<(TransferInfo, bool)> {
        let (owner, countersigned, destination, quantity, asset_id, kind) = match &transfer {
            TransferRequest::Unratified(t) => (
                t.owner,
                false,
                t.destination,
                t.quantity,
                t.asset_id,
                TransactionKind::TransferUnratified(t.clone()),
            ),
            TransferRequest::Countersigned(t) => (
                t.owner,
                t.countersigned,
                t.destination,
                t.quantity,
                t.asset_id,
                TransactionKind::TransferCountersigned(t.clone()),
            ),
        };

        if !self.network.owner_matches_network(&owner) {
            return Err(ValidationError::WrongNetworkForPublicKey.into());
        }
        if quantity == 0 {
            return Err(ValidationError::InvalidItem.into());
        }
        if countersigned && destination == Owner::default() {
            return Err(ConflictError::DoubleTransferAttempt.into());
        }
        if !self.packer.check_signature(&kind) {
            return Err(ValidationError::InvalidItem.into());
        }

        let block_number = self
            .asset_store
            .asset_block_number(&asset_id)
            .ok_or(ConflictError::AssetNotFound)?;
        let base_payments = self.payment_store.payments_for_block(block_number);
        let payments = scale_payments(&base_payments, 1);

        let (info, duplicate) = self.admit_single_tx(kind, payments, Vec::new()).await?;

        Ok((
            TransferInfo {
                tx_id: info.tx_id,
                packed: info.packed,
                pay_id: info.pay_id,
                payments: info.payments,
            },
            duplicate,
        ))
    }

    /// spec.md §4.2 "Grant": quantity/balance check, `spend` reservation.
    pub async fn store_grant(&self, grant: ShareGrant) -> ReservoirResult<(GrantInfo, bool)> {
        if grant.quantity == 0 {
            return Err(ValidationError::ShareQuantityTooSmall.into());
        }
        if grant.before_block <= self.block_store.height() {
            return Err(ValidationError::RecordHasExpired.into());
        }

        let spend_key = (grant.owner, grant.share_id);
        let balance = self.share_store.balance(&grant.owner, &grant.share_id);

        let block_number = self.block_store.height();
        let base_payments = self.payment_store.payments_for_block(block_number);
        let payments = scale_payments(&base_payments, 1);

        let kind = TransactionKind::ShareGrant(grant.clone());
        let (info, duplicate) = self
            .admit_single_tx(
                kind,
                payments,
                vec![SpendLeg {
                    key: spend_key,
                    balance,
                    quantity: grant.quantity,
                }],
            )
            .await?;

        let reserved_after = self.state.read().await.spend.get(&spend_key).copied().unwrap_or(0);
        let remaining = balance.saturating_sub(reserved_after);

        Ok((
            GrantInfo {
                tx_id: info.tx_id,
                packed: info.packed,
                pay_id: info.pay_id,
                payments: info.payments,
                remaining,
            },
            duplicate,
        ))
    }

    /// spec.md §4.2 "Swap": both legs — `(owner, share_id_out)` and
    /// `(counterparty, share_id_in)` — must independently cover their
    /// quantity net of existing reservations, and both are reserved
    /// atomically with admission (`original_source/reservoir/shareswap.go`
    /// `CheckSwapBalances` plus the two `globalData.spend[...] +=` sites).
    pub async fn store_swap(&self, swap: ShareSwap) -> ReservoirResult<(SwapInfo, bool)> {
        if swap.quantity_out == 0 || swap.quantity_in == 0 {
            return Err(ValidationError::ShareQuantityTooSmall.into());
        }
        if swap.before_block <= self.block_store.height() {
            return Err(ValidationError::RecordHasExpired.into());
        }

        let key_out = (swap.owner, swap.share_id_out);
        let balance_out = self.share_store.balance(&swap.owner, &swap.share_id_out);
        let key_in = (swap.counterparty, swap.share_id_in);
        let balance_in = self.share_store.balance(&swap.counterparty, &swap.share_id_in);

        let block_number = self.block_store.height();
        let base_payments = self.payment_store.payments_for_block(block_number);
        let payments = scale_payments(&base_payments, 1);

        let kind = TransactionKind::ShareSwap(swap.clone());
        let (info, duplicate) = self
            .admit_single_tx(
                kind,
                payments,
                vec![
                    SpendLeg {
                        key: key_out,
                        balance: balance_out,
                        quantity: swap.quantity_out,
                    },
                    SpendLeg {
                        key: key_in,
                        balance: balance_in,
                        quantity: swap.quantity_in,
                    },
                ],
            )
            .await?;

        let state = self.state.read().await;
        let reserved_out = state.spend.get(&key_out).copied().unwrap_or(0);
        let reserved_in = state.spend.get(&key_in).copied().unwrap_or(0);
        drop(state);

        Ok((
            SwapInfo {
                tx_id: info.tx_id,
                packed: info.packed,
                pay_id: info.pay_id,
                payments: info.payments,
                remaining_out: balance_out.saturating_sub(reserved_out),
                remaining_in: balance_in.saturating_sub(reserved_in),
            },
            duplicate,
        ))
    }

    /// Shared single-transaction admission used by transfer/grant/swap:
    /// duplicate detection, orphan/auto-verify shortcut, re-checked
    /// `spend` balances, capacity check, and insertion into
    /// `pendingTransactions`/`verifiedTransactions`. The balance checks for
    /// `spend_legs` run under the same write guard that later records the
    /// reservation, so two concurrent grants/swaps on the same
    /// `(owner, share_id)` can never both observe room and both reserve
    /// (spec.md §5 "re-check under exclusive before insert").
    async fn admit_single_tx(
        &self,
        kind: TransactionKind,
        payments: Vec<PaymentAlternative>,
        spend_legs: Vec<SpendLeg>,
    ) -> ReservoirResult<(SingleTxInfo, bool)> {
        let packed = self.packer.pack(&kind);
        let tx_id = self.packer.make_link(&packed);
        let pay_id = compute_pay_id(&[packed.clone()]);

        let mut state = self.state.write().await;

        if self.block_store.has(&tx_id) || state.is_confirmed_or_verified(&tx_id) {
            return Err(ConflictError::TransactionAlreadyExists.into());
        }

        if let Some(entry) = state.pending_transactions.get(&pay_id) {
            return Ok((
                SingleTxInfo {
                    tx_id,
                    packed,
                    pay_id,
                    payments: entry.payments.clone(),
                },
                true,
            ));
        }

        let duplicate = state.pending_index.contains_key(&tx_id);
        if duplicate {
            return Err(ConflictError::TransactionAlreadyExists.into());
        }

        for leg in &spend_legs {
            let reserved = *state.spend.get(&leg.key).unwrap_or(&0);
            if leg.balance < reserved + leg.quantity {
                return Err(ConflictError::InsufficientShares.into());
            }
        }

        let now = self.clock.now();
        let expires_at = now + self.config.reservoir_timeout;
        let tx = TransactionData {
            tx_id,
            body: kind,
            packed_bytes: packed.clone(),
        };

        let detail = state.orphan_payments.get(&pay_id).cloned();
        let should_check = detail.is_some() || self.config.auto_verify;
        if should_check {
            let detail = detail.unwrap_or_default();
            if acceptable_payment(&detail, &payments) {
                state.verified_index.insert(tx_id, pay_id);
                state.verified_transactions.insert(pay_id, tx);
                state.orphan_payments.remove(&pay_id);
                for leg in &spend_legs {
                    *state.spend.entry(leg.key).or_insert(0) += leg.quantity;
                }
                return Ok((
                    SingleTxInfo {
                        tx_id,
                        packed: packed.clone(),
                        pay_id,
                        payments,
                    },
                    false,
                ));
            }
        }

        if state.pending_paid_count + 1 >= self.config.maximum_pending_paid_issues {
            return Err(CapacityError::BufferCapacityLimit.into());
        }

        state.pending_index.insert(tx_id, pay_id);
        state.pending_paid_count += 1;
        for leg in &spend_legs {
            *state.spend.entry(leg.key).or_insert(0) += leg.quantity;
        }
        state.pending_transactions.insert(
            pay_id,
            TransactionPaymentData {
                pay_id,
                tx,
                payments: payments.clone(),
                expires_at,
            },
        );

        state.debug_assert_invariants();

        Ok((
            SingleTxInfo {
                tx_id,
                packed,
                pay_id,
                payments,
            },
            false,
        ))
    }
}

struct SingleTxInfo {
    tx_id: TxId,
    packed: Vec<u8>,
    pay_id: PayId,
    payments: Vec<PaymentAlternative>,
}

/// One `spend[...]` leg to re-check and reserve atomically inside
/// `admit_single_tx`'s write-locked section.
struct SpendLeg {
    key: (Owner, ShareId),
    balance: u64,
    quantity: u64,
}

/// Either kind of transfer admitted by `store_transfer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferRequest {
    Unratified(TransferUnratified),
    Countersigned(TransferCountersigned),
}

fn new_pay_nonce(block_store: &dyn crate::traits::BlockStore) -> PayNonce {
    let digest = block_store
        .digest_for_block(block_store.height())
        .unwrap_or([0u8; 32]);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    PayNonce(bytes)
}
