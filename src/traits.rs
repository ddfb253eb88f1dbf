//! Capability interfaces for every collaborator named in spec.md §1/§6.
//! The reservoir and voting machine depend only on these traits, never on
//! a concrete storage or transport implementation — the same boundary the
//! teacher draws between `ckb-tx-pool` and `ckb-store`/`ckb-network` via
//! `ckb-traits`/`ckb-snapshot`.

use async_trait::async_trait;

use crate::types::{AssetId, Owner, Payment, PeerId, ShareId, TransactionKind, TxId};

/// Block storage / block-ring buffer contract (spec.md §6).
pub trait BlockStore: Send + Sync {
    fn get_n(&self, key: &[u8]) -> Option<u64>;
    fn get_nb(&self, key: &[u8]) -> Option<(u64, Vec<u8>)>;
    fn has(&self, tx_id: &TxId) -> bool;
    fn height(&self) -> u64;
    fn digest_for_block(&self, height: u64) -> Option<[u8; 32]>;
    fn last_element(&self) -> Option<(u64, [u8; 32])>;

    /// A cursor over the on-disk block table, seeked and walked during
    /// startup recovery (spec.md §4.7 `Blocks.NewFetchCursor`). Stores with
    /// nothing to recover from may keep the default, which yields no items.
    fn new_fetch_cursor(&self) -> Box<dyn FetchCursor> {
        Box::new(EmptyCursor)
    }
}

/// Streams `(key, value)` pairs from a seek point, spec.md §6's
/// `NewFetchCursor() -> Cursor` with `Seek(key)`, `Fetch(n) -> [(key,value)]`.
pub trait FetchCursor: Send + Sync {
    fn seek(&mut self, key: &[u8]);
    fn fetch(&mut self, n: usize) -> Vec<(Vec<u8>, Vec<u8>)>;
}

struct EmptyCursor;

impl FetchCursor for EmptyCursor {
    fn seek(&mut self, _key: &[u8]) {}
    fn fetch(&mut self, _n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
        Vec::new()
    }
}

/// The in-memory block-ring buffer that startup recovery repopulates from
/// disk (spec.md §4.7); never persisted itself.
pub trait BlockRing: Send + Sync {
    fn clear(&self);
    fn put(&self, height: u64, digest: [u8; 32], packed: Vec<u8>);
    fn size(&self) -> usize;
}

/// Resolves whether an asset is confirmed and at which block it was
/// issued.
pub trait AssetStore: Send + Sync {
    fn asset_exists(&self, asset_id: &AssetId) -> bool;
    fn asset_block_number(&self, asset_id: &AssetId) -> Option<u64>;
}

/// Block-owner payment table, keyed by the asset/ownership's block number.
pub trait BlockOwnerPaymentStore: Send + Sync {
    fn payments_for_block(&self, block_number: u64) -> Vec<Payment>;
}

/// Confirmed share balances, net of reservations tracked by the reservoir
/// itself.
pub trait ShareBalanceStore: Send + Sync {
    fn balance(&self, owner: &Owner, share_id: &ShareId) -> u64;
}

/// Point-to-point peer transport requests used by the voting machine
/// (spec.md §6: `QueryBlockHeight`, `RemoteDigestOfHeight`).
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn query_block_height(&self, peer: &PeerId) -> Option<u64>;
    async fn remote_digest_of_height(&self, peer: &PeerId, height: u64) -> Option<[u8; 32]>;
}

/// Transaction record encoding and signature verification (spec.md §1:
/// `Pack`, `MakeLink`, `CheckSignature`).
pub trait Packer: Send + Sync {
    fn pack(&self, kind: &TransactionKind) -> Vec<u8>;
    fn make_link(&self, packed: &[u8]) -> TxId;
    fn check_signature(&self, kind: &TransactionKind) -> bool;
}

/// Classifies whether an owner's public key belongs to the network this
/// node is running on (mainnet vs. testnet), surfaced as
/// `ValidationError::WrongNetworkForPublicKey` when it disagrees.
pub trait NetworkClassifier: Send + Sync {
    fn owner_matches_network(&self, owner: &Owner) -> bool;
}
