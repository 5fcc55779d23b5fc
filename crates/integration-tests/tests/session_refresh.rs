//! Token refresh and forced sign-out flows.

#![allow(clippy::unwrap_used)]

use sartoria_integration_tests::{SEED_EMAIL, SEED_PASSWORD, TestBackend, client_state};
use sartoria_storefront::models::Order;
use sartoria_storefront::storage::keys;
use sartoria_storefront::{SessionEndReason, SessionError, Storage};

#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    let (access, refresh) = backend.issue_session();
    storage.seed(keys::ACCESS_TOKEN, &access);
    storage.seed(keys::REFRESH_TOKEN, &refresh);
    backend.expire_access(&access);

    // The caller sees a plain success; expiry is handled internally
    let orders: Vec<Order> = state.session().get_authenticated("orders").await.unwrap();

    assert!(orders.is_empty());
    assert_eq!(backend.refresh_calls(), 1);
    assert!(state.session().is_authenticated());

    // The stored pair was rotated
    let rotated = storage.get(keys::ACCESS_TOKEN).unwrap().unwrap();
    assert_ne!(rotated, access);
}

#[tokio::test]
async fn test_concurrent_expired_calls_share_one_refresh() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    let (access, refresh) = backend.issue_session();
    storage.seed(keys::ACCESS_TOKEN, &access);
    storage.seed(keys::REFRESH_TOKEN, &refresh);
    backend.expire_access(&access);

    let (a, b) = tokio::join!(
        state.session().get_authenticated::<Vec<Order>>("orders"),
        state.session().get_authenticated::<Vec<Order>>("orders"),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_refresh_failure_signs_out() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    state
        .session()
        .login(SEED_EMAIL, SEED_PASSWORD)
        .await
        .unwrap();
    let refresh = storage.get(keys::REFRESH_TOKEN).unwrap().unwrap();
    backend.revoke_refresh(&refresh);

    let err = state.session().refresh_session().await.unwrap_err();

    match err {
        SessionError::SessionEnded { reason } => {
            assert_eq!(reason, SessionEndReason::SessionExpired);
            assert_eq!(reason.as_str(), "session_expired");
        }
        other => panic!("expected SessionEnded, got {other:?}"),
    }
    assert!(!state.session().is_authenticated());
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::REFRESH_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_invalid_token_signs_out_without_refresh() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    storage.seed(keys::ACCESS_TOKEN, "forged-token");
    storage.seed(keys::REFRESH_TOKEN, "forged-refresh");

    let err = state
        .session()
        .get_authenticated::<Vec<Order>>("orders")
        .await
        .unwrap_err();

    match err {
        SessionError::SessionEnded { reason } => {
            assert_eq!(reason, SessionEndReason::InvalidToken);
        }
        other => panic!("expected SessionEnded, got {other:?}"),
    }
    // An invalid token is not recoverable, so no refresh is attempted
    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_second_expiry_after_refresh_is_hard_failure() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    let (access, refresh) = backend.issue_session();
    storage.seed(keys::ACCESS_TOKEN, &access);
    storage.seed(keys::REFRESH_TOKEN, &refresh);
    backend.expire_access(&access);
    // The refreshed token will itself arrive expired
    backend.set_issue_expired(true);

    let err = state
        .session()
        .get_authenticated::<Vec<Order>>("orders")
        .await
        .unwrap_err();

    match err {
        SessionError::SessionEnded { reason } => {
            assert_eq!(reason, SessionEndReason::SessionExpired);
        }
        other => panic!("expected SessionEnded, got {other:?}"),
    }
    // Exactly one refresh: the retry's 401 must not trigger another
    assert_eq!(backend.refresh_calls(), 1);
    assert!(!state.session().is_authenticated());
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_explicit_refresh_rotates_tokens() {
    let backend = TestBackend::spawn().await;
    let (state, storage) = client_state(&backend);
    state
        .session()
        .login(SEED_EMAIL, SEED_PASSWORD)
        .await
        .unwrap();
    let old_access = storage.get(keys::ACCESS_TOKEN).unwrap().unwrap();
    let old_refresh = storage.get(keys::REFRESH_TOKEN).unwrap().unwrap();

    state.session().refresh_session().await.unwrap();

    assert!(state.session().is_authenticated());
    assert_ne!(storage.get(keys::ACCESS_TOKEN).unwrap().unwrap(), old_access);
    assert_ne!(
        storage.get(keys::REFRESH_TOKEN).unwrap().unwrap(),
        old_refresh
    );
}
