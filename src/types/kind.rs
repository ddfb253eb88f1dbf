//! Tagged transaction-kind variants, replacing the source's runtime type
//! switch over transaction records (spec.md §9 REDESIGN FLAGS).

use super::ids::{AssetId, Owner, ShareId};

/// A single issue request within a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub owner: Owner,
    pub asset_id: AssetId,
    /// Zero marks the issue as eligible for the free (proof-of-work) path;
    /// any other value is only meaningful as "paid requested".
    pub nonce: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferUnratified {
    pub owner: Owner,
    pub previous_tx_id: super::ids::TxId,
    pub asset_id: AssetId,
    pub destination: Owner,
    pub quantity: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferCountersigned {
    pub owner: Owner,
    pub previous_tx_id: super::ids::TxId,
    pub asset_id: AssetId,
    pub destination: Owner,
    pub quantity: u64,
    pub countersigned: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareGrant {
    pub owner: Owner,
    pub recipient: Owner,
    pub share_id: ShareId,
    pub quantity: u64,
    pub before_block: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareSwap {
    pub owner: Owner,
    pub counterparty: Owner,
    pub share_id_out: ShareId,
    pub quantity_out: u64,
    pub share_id_in: ShareId,
    pub quantity_in: u64,
    pub before_block: u64,
}

/// Tagged variant covering every transaction kind the reservoir admits,
/// plus the two out-of-scope kinds named in spec.md §9 as unit variants so
/// a `pack` dispatch can match exhaustively without constructing them here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Issue(Issue),
    TransferUnratified(TransferUnratified),
    TransferCountersigned(TransferCountersigned),
    ShareGrant(ShareGrant),
    ShareSwap(ShareSwap),
    BlockFoundation,
    BlockOwnerTransfer,
}

impl TransactionKind {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionKind::Issue(_) => "issue",
            TransactionKind::TransferUnratified(_) => "transfer-unratified",
            TransactionKind::TransferCountersigned(_) => "transfer-countersigned",
            TransactionKind::ShareGrant(_) => "share-grant",
            TransactionKind::ShareSwap(_) => "share-swap",
            TransactionKind::BlockFoundation => "block-foundation",
            TransactionKind::BlockOwnerTransfer => "block-owner-transfer",
        }
    }
}
