//! Share-swap two-leg reservation scenarios (spec.md §4.2 "Swap",
//! property 6). Reservation state is verified indirectly through the
//! public API (`store_grant` against the same `(owner, share_id)` key),
//! since `Reservoir`'s internal state is not visible outside the crate.

use std::sync::Arc;
use std::time::Duration;

use reservoir_core::config::ReservoirConfig;
use reservoir_core::reservoir::Reservoir;
use reservoir_core::testing::{
    AlwaysOnNetwork, FakeAssetStore, FakeBlockStore, FakePacker, FakePaymentStore, FakeShareStore,
};
use reservoir_core::time::FakeClock;
use reservoir_core::types::{Owner, ShareGrant, ShareId, ShareSwap};
use reservoir_core::ReservoirError;

fn build_with_balances(
    config: ReservoirConfig,
    owner: Owner,
    share_id_out: ShareId,
    balance_out: u64,
    counterparty: Owner,
    share_id_in: ShareId,
    balance_in: u64,
) -> Reservoir {
    let share_store = FakeShareStore::default();
    share_store.set_balance(owner, share_id_out, balance_out);
    share_store.set_balance(counterparty, share_id_in, balance_in);

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
async fn swap_reserves_both_legs_and_reports_both_remainders() {
    let owner = Owner([10; 32]);
    let counterparty = Owner([11; 32]);
    let share_id_out = ShareId([20; 32]);
    let share_id_in = ShareId([21; 32]);

    let reservoir = build_with_balances(
        ReservoirConfig::default(),
        owner,
        share_id_out,
        10,
        counterparty,
        share_id_in,
        5,
    );

    let swap = ShareSwap {
        owner,
        counterparty,
        share_id_out,
        quantity_out: 4,
        share_id_in,
        quantity_in: 5,
        before_block: 2_000,
    };

    let (info, duplicate) = reservoir.store_swap(swap).await.unwrap();
    assert!(!duplicate);
    assert_eq!(info.remaining_out, 6);
    assert_eq!(info.remaining_in, 0);

    // Out leg: 6 units of headroom remain (10 balance - 4 reserved).
    let small_grant = ShareGrant {
        owner,
        recipient: Owner([99; 32]),
        share_id: share_id_out,
        quantity: 6,
        before_block: 2_000,
    };
    let (grant_info, _dup) = reservoir.store_grant(small_grant).await.unwrap();
    assert_eq!(grant_info.remaining, 0);

    // In leg: the counterparty's whole balance is already reserved by the
    // swap, so any further grant against that key is rejected.
    let over_budget = ShareGrant {
        owner: counterparty,
        recipient: Owner([98; 32]),
        share_id: share_id_in,
        quantity: 1,
        before_block: 2_000,
    };
    let err = reservoir.store_grant(over_budget).await.unwrap_err();
    assert!(matches!(
        err,
        ReservoirError::Conflict(reservoir_core::error::ConflictError::InsufficientShares)
    ));
}

#[tokio::test]
async fn counterparty_insufficient_balance_rejects_the_whole_swap() {
    let owner = Owner([12; 32]);
    let counterparty = Owner([13; 32]);
    let share_id_out = ShareId([22; 32]);
    let share_id_in = ShareId([23; 32]);

    let reservoir = build_with_balances(
        ReservoirConfig::default(),
        owner,
        share_id_out,
        100,
        counterparty,
        share_id_in,
        3,
    );

    let swap = ShareSwap {
        owner,
        counterparty,
        share_id_out,
        quantity_out: 1,
        share_id_in,
        quantity_in: 4,
        before_block: 2_000,
    };

    let err = reservoir.store_swap(swap).await.unwrap_err();
    assert!(matches!(
        err,
        ReservoirError::Conflict(reservoir_core::error::ConflictError::InsufficientShares)
    ));

    // Neither leg was reserved: the out leg had ample room, but the whole
    // swap must fail atomically when either leg is short. Prove it by
    // granting the out leg's full balance afterwards.
    let full_grant = ShareGrant {
        owner,
        recipient: Owner([97; 32]),
        share_id: share_id_out,
        quantity: 100,
        before_block: 2_000,
    };
    let (grant_info, _dup) = reservoir.store_grant(full_grant).await.unwrap();
    assert_eq!(grant_info.remaining, 0);
}

#[tokio::test]
async fn eviction_releases_both_legs() {
    let owner = Owner([14; 32]);
    let counterparty = Owner([15; 32]);
    let share_id_out = ShareId([24; 32]);
    let share_id_in = ShareId([25; 32]);

    let mut config = ReservoirConfig::default();
    config.reservoir_timeout = Duration::from_secs(1);
    let reservoir = build_with_balances(config, owner, share_id_out, 10, counterparty, share_id_in, 10);

    let swap = ShareSwap {
        owner,
        counterparty,
        share_id_out,
        quantity_out: 10,
        share_id_in,
        quantity_in: 10,
        before_block: 2_000,
    };
    let (info, _duplicate) = reservoir.store_swap(swap).await.unwrap();
    assert_eq!(info.remaining_out, 0);
    assert_eq!(info.remaining_in, 0);

    let far_future = std::time::UNIX_EPOCH + Duration::from_secs(10);
    let evicted = reservoir.evict_expired(far_future).await;
    assert_eq!(evicted, 1);

    // Both legs' balances are fully free again.
    let retry_out = ShareGrant {
        owner,
        recipient: Owner([96; 32]),
        share_id: share_id_out,
        quantity: 10,
        before_block: 2_000,
    };
    let (out_info, _dup) = reservoir.store_grant(retry_out).await.unwrap();
    assert_eq!(out_info.remaining, 0);

    let retry_in = ShareGrant {
        owner: counterparty,
        recipient: Owner([95; 32]),
        share_id: share_id_in,
        quantity: 10,
        before_block: 2_000,
    };
    let (in_info, _dup) = reservoir.store_grant(retry_in).await.unwrap();
    assert_eq!(in_info.remaining, 0);
}
