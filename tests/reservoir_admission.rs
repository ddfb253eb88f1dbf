//! Admission pipeline scenarios from spec.md §8.

use reservoir_core::testing::{build_test_reservoir, FREE_ASSET, PAID_ASSET, UNKNOWN_ASSET};
use reservoir_core::types::{Issue, Owner};
use reservoir_core::ReservoirError;

fn issue(owner: u8, asset: reservoir_core::types::AssetId, nonce: u64) -> Issue {
    Issue {
        owner: Owner([owner; 32]),
        asset_id: asset,
        nonce,
    }
}

#[tokio::test]
async fn free_issue_happy_path() {
    let reservoir = build_test_reservoir();

    let batch = vec![issue(1, FREE_ASSET, 0)];
    let (info, duplicate) = reservoir.store_issues(batch).await.unwrap();

    assert!(!duplicate);
    assert!(info.nonce.is_some());
    assert!(info.difficulty.is_some());
    assert!(info.payments.is_none());
    assert_eq!(reservoir.pending_free_count().await, 1);
}

#[tokio::test]
async fn paid_issue_unknown_asset_leaves_no_state_change() {
    let reservoir = build_test_reservoir();

    let batch = vec![issue(1, UNKNOWN_ASSET, 5)];
    let err = reservoir.store_issues(batch).await.unwrap_err();

    assert!(matches!(
        err,
        ReservoirError::Conflict(reservoir_core::error::ConflictError::AssetNotFound)
    ));
    assert_eq!(reservoir.pending_free_count().await, 0);
    assert_eq!(reservoir.pending_paid_count().await, 0);
}

#[tokio::test]
async fn resubmission_is_idempotent() {
    let reservoir = build_test_reservoir();

    let batch = vec![issue(1, FREE_ASSET, 0)];
    let (first, dup1) = reservoir.store_issues(batch.clone()).await.unwrap();
    assert!(!dup1);

    let (second, dup2) = reservoir.store_issues(batch).await.unwrap();
    assert!(dup2);
    assert_eq!(first.pay_id, second.pay_id);
    assert_eq!(first.tx_ids, second.tx_ids);
    assert_eq!(first.difficulty, second.difficulty);
    assert_eq!(reservoir.pending_free_count().await, 1);
}

#[tokio::test]
async fn overlapping_pay_id_rejected_without_disturbing_original() {
    let reservoir = build_test_reservoir();

    let a = issue(1, FREE_ASSET, 0);
    let b = issue(2, FREE_ASSET, 0);
    let c = issue(3, FREE_ASSET, 0);

    let (first, dup) = reservoir.store_issues(vec![a.clone(), b]).await.unwrap();
    assert!(!dup);

    let err = reservoir.store_issues(vec![a, c]).await.unwrap_err();
    assert!(matches!(
        err,
        ReservoirError::Conflict(reservoir_core::error::ConflictError::TransactionAlreadyExists)
    ));

    assert_eq!(reservoir.pending_free_count().await, first.tx_ids.len());
}

#[tokio::test]
async fn capacity_limit_rejects_once_free_buffer_is_full() {
    let mut config = reservoir_core::config::ReservoirConfig::default();
    config.maximum_pending_free_issues = 1;
    let reservoir = reservoir_core::testing::build_test_reservoir_with(config);

    let (_info, _dup) = reservoir.store_issues(vec![issue(1, FREE_ASSET, 0)]).await.unwrap();
    assert_eq!(reservoir.pending_free_count().await, 1);

    let err = reservoir.store_issues(vec![issue(2, FREE_ASSET, 0)]).await.unwrap_err();
    assert!(matches!(
        err,
        ReservoirError::Capacity(reservoir_core::error::CapacityError::BufferCapacityLimit)
    ));
    assert_eq!(reservoir.pending_free_count().await, 1);
}

#[tokio::test]
async fn paid_issue_requires_payment_and_is_grounded_by_asset_block() {
    let reservoir = build_test_reservoir();

    let batch = vec![issue(1, PAID_ASSET, 7)];
    let (info, duplicate) = reservoir.store_issues(batch).await.unwrap();

    assert!(!duplicate);
    assert!(info.payments.is_some());
    assert!(info.nonce.is_none());
    assert_eq!(reservoir.pending_paid_count().await, 1);
}
