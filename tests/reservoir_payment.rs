//! Payment reconciler and spend-accounting scenarios from spec.md §8
//! (properties 5 and 6).

use std::sync::Arc;
use std::time::Duration;

use reservoir_core::config::ReservoirConfig;
use reservoir_core::reservoir::{hash::compute_pay_id, Reservoir};
use reservoir_core::testing::{
    AlwaysOnNetwork, FakeAssetStore, FakeBlockStore, FakePacker, FakePaymentStore, FakeShareStore,
};
use reservoir_core::time::FakeClock;
use reservoir_core::traits::Packer;
use reservoir_core::types::{Owner, PaymentDetail, ShareGrant, ShareId, TransactionKind};
use reservoir_core::ReservoirError;

fn build_with_balance(config: ReservoirConfig, owner: Owner, share_id: ShareId, balance: u64) -> Reservoir {
    let share_store = FakeShareStore::default();
    share_store.set_balance(owner, share_id, balance);

    Reservoir::new(
        config,
        Arc::new(FakeClock::new(0)),
        Arc::new(FakeBlockStore::new(1_000)),
        Arc::new(FakeAssetStore::default()),
        Arc::new(FakePaymentStore::default()),
        Arc::new(share_store),
        Arc::new(FakePacker),
        Arc::new(AlwaysOnNetwork),
    )
}

#[tokio::test]
async fn orphan_payment_arriving_first_is_picked_up_by_grant_admission() {
    let owner = Owner([4; 32]);
    let share_id = ShareId([1; 32]);
    let reservoir = build_with_balance(ReservoirConfig::default(), owner, share_id, 10);

    let grant = ShareGrant {
        owner,
        recipient: Owner([5; 32]),
        share_id,
        quantity: 10,
        before_block: 2_000,
    };

    let packed = FakePacker.pack(&TransactionKind::ShareGrant(grant.clone()));
    let pay_id = compute_pay_id(&[packed]);

    let mut detail = PaymentDetail::new();
    detail.observe("BTC", "addr-1", 1_000);
    reservoir.accept_payment(pay_id, detail).await;

    let (info, duplicate) = reservoir.store_grant(grant).await.unwrap();
    assert!(!duplicate);
    assert_eq!(info.remaining, 0);
    assert_eq!(info.pay_id, pay_id);
}

#[tokio::test]
async fn spend_reservation_never_exceeds_balance_and_eviction_restores_it() {
    let owner = Owner([6; 32]);
    let share_id = ShareId([2; 32]);
    let mut config = ReservoirConfig::default();
    config.reservoir_timeout = Duration::from_secs(1);
    let reservoir = build_with_balance(config, owner, share_id, 5);

    let grant = ShareGrant {
        owner,
        recipient: Owner([7; 32]),
        share_id,
        quantity: 5,
        before_block: 2_000,
    };
    let (info, _duplicate) = reservoir.store_grant(grant).await.unwrap();
    assert_eq!(info.remaining, 0);

    let over_budget = ShareGrant {
        owner,
        recipient: Owner([8; 32]),
        share_id,
        quantity: 1,
        before_block: 2_000,
    };
    let err = reservoir.store_grant(over_budget).await.unwrap_err();
    assert!(matches!(
        err,
        ReservoirError::Conflict(reservoir_core::error::ConflictError::InsufficientShares)
    ));

    let far_future = std::time::UNIX_EPOCH + Duration::from_secs(10);
    let evicted = reservoir.evict_expired(far_future).await;
    assert_eq!(evicted, 1);

    // Balance is freed: a grant for the full amount succeeds again.
    let retry = ShareGrant {
        owner,
        recipient: Owner([9; 32]),
        share_id,
        quantity: 5,
        before_block: 2_000,
    };
    let (retry_info, _duplicate) = reservoir.store_grant(retry).await.unwrap();
    assert_eq!(retry_info.remaining, 0);
}
