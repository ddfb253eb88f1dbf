//! The pending-transaction reservoir: admission pipeline, proof-of-work
//! verifier, payment reconciler, and expiry sweeper (spec.md §4.1-§4.5).

pub mod admission;
pub mod difficulty;
pub mod hash;
pub mod payment;
pub mod pow;
pub mod recovery;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::ReservoirConfig;
use crate::time::Clock;
use crate::traits::{
    AssetStore, BlockOwnerPaymentStore, BlockStore, NetworkClassifier, Packer, ShareBalanceStore,
};
use crate::types::{Difficulty, PayId, PaymentAlternative, PayNonce, TxId};

pub use admission::TransferRequest;
pub use recovery::recover_block_ring;
pub use store::{Container, ReservoirState};

/// Result of `store_issues`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueInfo {
    pub tx_ids: Vec<TxId>,
    pub packed: Vec<u8>,
    pub pay_id: PayId,
    pub nonce: Option<PayNonce>,
    pub difficulty: Option<Difficulty>,
    pub payments: Option<Vec<PaymentAlternative>>,
}

/// Result of `store_transfer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferInfo {
    pub tx_id: TxId,
    pub packed: Vec<u8>,
    pub pay_id: PayId,
    pub payments: Vec<PaymentAlternative>,
}

/// Result of `store_grant`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantInfo {
    pub tx_id: TxId,
    pub packed: Vec<u8>,
    pub pay_id: PayId,
    pub payments: Vec<PaymentAlternative>,
    /// Balance left after this grant's reservation, for the caller to
    /// quote back without a second balance lookup.
    pub remaining: u64,
}

/// Result of `store_swap`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapInfo {
    pub tx_id: TxId,
    pub packed: Vec<u8>,
    pub pay_id: PayId,
    pub payments: Vec<PaymentAlternative>,
    /// Balance left on the `owner`/`share_id_out` leg after this swap's
    /// reservation.
    pub remaining_out: u64,
    /// Balance left on the `counterparty`/`share_id_in` leg after this
    /// swap's reservation.
    pub remaining_in: u64,
}

/// The reservoir: an explicit owned object holding the ten indexes behind
/// one exclusive lock, plus the injected collaborator handles (spec.md §9:
/// no hidden process-wide globals).
pub struct Reservoir {
    pub(crate) state: RwLock<ReservoirState>,
    pub(crate) config: ReservoirConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) block_store: Arc<dyn BlockStore>,
    pub(crate) asset_store: Arc<dyn AssetStore>,
    pub(crate) payment_store: Arc<dyn BlockOwnerPaymentStore>,
    pub(crate) share_store: Arc<dyn ShareBalanceStore>,
    pub(crate) packer: Arc<dyn Packer>,
    pub(crate) network: Arc<dyn NetworkClassifier>,
}

impl Reservoir {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ReservoirConfig,
        clock: Arc<dyn Clock>,
        block_store: Arc<dyn BlockStore>,
        asset_store: Arc<dyn AssetStore>,
        payment_store: Arc<dyn BlockOwnerPaymentStore>,
        share_store: Arc<dyn ShareBalanceStore>,
        packer: Arc<dyn Packer>,
        network: Arc<dyn NetworkClassifier>,
    ) -> Self {
        Self {
            state: RwLock::new(ReservoirState::new()),
            config,
            clock,
            block_store,
            asset_store,
            payment_store,
            share_store,
            packer,
            network,
        }
    }

    /// Snapshot counters, useful for metrics/tests without taking the full
    /// state out of the lock.
    pub async fn pending_free_count(&self) -> usize {
        self.state.read().await.pending_free_count
    }

    pub async fn pending_paid_count(&self) -> usize {
        self.state.read().await.pending_paid_count
    }
}
