//! Minimal in-memory collaborator implementations and a `Reservoir`
//! builder, shared between this crate's unit tests and its `tests/`
//! integration tests — grounded on the teacher's `component/tests/util.rs`
//! convention of a small shared fixture module per test tree.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha3::{Digest, Sha3_256};

use async_trait::async_trait;

use crate::config::ReservoirConfig;
use crate::reservoir::Reservoir;
use crate::time::FakeClock;
use crate::traits::{
    AssetStore, BlockOwnerPaymentStore, BlockStore, NetworkClassifier, Packer, PeerTransport,
    ShareBalanceStore,
};
use crate::types::{AssetId, Owner, Payment, PeerId, ShareId, TransactionKind, TxId};

pub const PAID_ASSET: AssetId = AssetId([0x42; 32]);
pub const FREE_ASSET: AssetId = AssetId([0x24; 32]);
pub const UNKNOWN_ASSET: AssetId = AssetId([0xee; 32]);

/// A block store whose height is fixed and whose digests are derived
/// deterministically from the block number, so the proof-of-work window
/// is reproducible in tests without faking a whole chain.
pub struct FakeBlockStore {
    pub height: Mutex<u64>,
    pub confirmed: Mutex<std::collections::HashSet<TxId>>,
}

impl FakeBlockStore {
    pub fn new(height: u64) -> Self {
        Self {
            height: Mutex::new(height),
            confirmed: Mutex::new(Default::default()),
        }
    }

    pub fn set_height(&self, height: u64) {
        *self.height.lock().unwrap() = height;
    }

    pub fn confirm(&self, tx_id: TxId) {
        self.confirmed.lock().unwrap().insert(tx_id);
    }
}

impl BlockStore for FakeBlockStore {
    fn get_n(&self, _key: &[u8]) -> Option<u64> {
        None
    }

    fn get_nb(&self, _key: &[u8]) -> Option<(u64, Vec<u8>)> {
        None
    }

    fn has(&self, tx_id: &TxId) -> bool {
        self.confirmed.lock().unwrap().contains(tx_id)
    }

    fn height(&self) -> u64 {
        *self.height.lock().unwrap()
    }

    fn digest_for_block(&self, height: u64) -> Option<[u8; 32]> {
        let mut hasher = Sha3_256::new();
        hasher.update(height.to_be_bytes());
        let out = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&out);
        Some(bytes)
    }

    fn last_element(&self) -> Option<(u64, [u8; 32])> {
        let height = self.height();
        self.digest_for_block(height).map(|d| (height, d))
    }
}

pub struct FakeAssetStore {
    pub block_numbers: HashMap<AssetId, u64>,
}

impl Default for FakeAssetStore {
    fn default() -> Self {
        let mut block_numbers = HashMap::new();
        block_numbers.insert(PAID_ASSET, 10);
        block_numbers.insert(FREE_ASSET, 10);
        Self { block_numbers }
    }
}

impl AssetStore for FakeAssetStore {
    fn asset_exists(&self, asset_id: &AssetId) -> bool {
        *asset_id != UNKNOWN_ASSET
    }

    fn asset_block_number(&self, asset_id: &AssetId) -> Option<u64> {
        self.block_numbers.get(asset_id).copied()
    }
}

pub struct FakePaymentStore {
    pub payments: Vec<Payment>,
}

impl Default for FakePaymentStore {
    fn default() -> Self {
        Self {
            payments: vec![Payment {
                currency: "BTC".to_string(),
                address: "addr-1".to_string(),
                amount: 1_000,
            }],
        }
    }
}

impl BlockOwnerPaymentStore for FakePaymentStore {
    fn payments_for_block(&self, _block_number: u64) -> Vec<Payment> {
        self.payments.clone()
    }
}

#[derive(Default)]
pub struct FakeShareStore {
    pub balances: Mutex<HashMap<(Owner, ShareId), u64>>,
}

impl FakeShareStore {
    pub fn set_balance(&self, owner: Owner, share_id: ShareId, amount: u64) {
        self.balances.lock().unwrap().insert((owner, share_id), amount);
    }
}

impl ShareBalanceStore for FakeShareStore {
    fn balance(&self, owner: &Owner, share_id: &ShareId) -> u64 {
        *self.balances.lock().unwrap().get(&(*owner, *share_id)).unwrap_or(&0)
    }
}

/// Packs a transaction kind by hashing its `Debug` representation; good
/// enough to produce distinct, deterministic `TxId`s in tests without a
/// real wire codec.
pub struct FakePacker;

impl Packer for FakePacker {
    fn pack(&self, kind: &TransactionKind) -> Vec<u8> {
        format!("{kind:?}").into_bytes()
    }

    fn make_link(&self, packed: &[u8]) -> TxId {
        let mut hasher = Sha3_256::new();
        hasher.update(packed);
        let out = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&out);
        TxId(bytes)
    }

    fn check_signature(&self, _kind: &TransactionKind) -> bool {
        true
    }
}

pub struct AlwaysOnNetwork;

impl NetworkClassifier for AlwaysOnNetwork {
    fn owner_matches_network(&self, _owner: &Owner) -> bool {
        true
    }
}

/// A peer transport with a fixed, per-peer canned response, for voting
/// machine tests that need deterministic poll results without real
/// networking.
#[derive(Default)]
pub struct FakePeerTransport {
    pub responses: Mutex<HashMap<PeerId, (Option<u64>, Option<[u8; 32]>)>>,
}

impl FakePeerTransport {
    pub fn set_response(&self, peer_id: PeerId, height: Option<u64>, digest: Option<[u8; 32]>) {
        self.responses.lock().unwrap().insert(peer_id, (height, digest));
    }
}

#[async_trait]
impl PeerTransport for FakePeerTransport {
    async fn query_block_height(&self, peer: &PeerId) -> Option<u64> {
        self.responses.lock().unwrap().get(peer).and_then(|(h, _)| *h)
    }

    async fn remote_digest_of_height(&self, peer: &PeerId, _height: u64) -> Option<[u8; 32]> {
        self.responses.lock().unwrap().get(peer).and_then(|(_, d)| *d)
    }
}

pub fn build_test_reservoir() -> Reservoir {
    build_test_reservoir_with(ReservoirConfig::default())
}

pub fn build_test_reservoir_with(config: ReservoirConfig) -> Reservoir {
    Reservoir::new(
        config,
        Arc::new(FakeClock::new(0)),
        Arc::new(FakeBlockStore::new(1_000)),
        Arc::new(FakeAssetStore::default()),
        Arc::new(FakePaymentStore::default()),
        Arc::new(FakeShareStore::default()),
        Arc::new(FakePacker),
        Arc::new(AlwaysOnNetwork),
    )
}
