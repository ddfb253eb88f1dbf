//! Entry records wrapping admitted transactions, as laid out in spec.md §3.

use std::time::SystemTime;

use super::ids::{AssetId, ClientNonce, PayId, TxId};
use super::kind::TransactionKind;
use super::payment::{Payment, PaymentAlternative};

/// Every accepted transaction is wrapped with its derived id and packed
/// bytes alongside the parsed body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionData {
    pub tx_id: TxId,
    pub body: TransactionKind,
    pub packed_bytes: Vec<u8>,
}

/// A batch of free issues (nonce == 0 for every issue) awaiting a
/// proof-of-work submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueFreeData {
    pub pay_id: PayId,
    pub txs: Vec<TransactionData>,
    pub nonce: super::ids::PayNonce,
    pub client_nonce: Option<ClientNonce>,
    pub difficulty: Difficulty,
    pub asset_id: AssetId,
    pub expires_at: SystemTime,
}

/// A batch of issues awaiting payment evidence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuePaymentData {
    pub pay_id: PayId,
    pub txs: Vec<TransactionData>,
    pub payments: Vec<PaymentAlternative>,
    pub expires_at: SystemTime,
}

/// A single transaction (transfer/grant/swap) awaiting payment evidence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionPaymentData {
    pub pay_id: PayId,
    pub tx: TransactionData,
    pub payments: Vec<PaymentAlternative>,
    pub expires_at: SystemTime,
}

/// Difficulty target: a 256-bit big-endian value represented as 32 bytes,
/// compared against a SHA3-256 digest as a big-endian unsigned integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Difficulty(pub [u8; 32]);

impl Difficulty {
    pub fn meets(&self, digest: &[u8; 32]) -> bool {
        digest.as_slice() <= self.0.as_slice()
    }
}

/// Helper to build a single-payment alternative list, used by the admission
/// pipeline when quoting block-owner payment amounts scaled by batch size.
pub fn scale_payments(base: &[Payment], multiplier: u64) -> Vec<PaymentAlternative> {
    vec![PaymentAlternative(
        base.iter()
            .map(|p| Payment {
                currency: p.currency.clone(),
                address: p.address.clone(),
                amount: p.amount.saturating_mul(multiplier),
            })
            .collect(),
    )]
}
