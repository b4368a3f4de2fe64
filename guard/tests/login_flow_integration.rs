//! Login flow integration tests.
//!
//! Drives `LoginFlow` with the mock identity provider and checks the caller
//! contract: filter, permit, authenticate, record.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::Duration;
use login_guard::mocks::{MockIdentityProvider, MockLockStore};
use login_guard::stores::MemoryLockStore;
use login_guard::{GuardConfig, GuardError, LockStatus, LockoutGuard, LoginFlow};
use login_guard_testing::{ManualClock, init_test_tracing};
use std::sync::Arc;

const EMAIL: &str = "test@test.com";
const PASSWORD: &str = "Test123!";

fn provider() -> MockIdentityProvider {
    MockIdentityProvider::new().with_account(EMAIL, PASSWORD)
}

fn flow_with<S: login_guard::providers::LockStore>(
    config: GuardConfig,
    store: S,
    clock: &ManualClock,
    provider: MockIdentityProvider,
) -> LoginFlow<MockIdentityProvider, S> {
    init_test_tracing();
    let guard = LockoutGuard::new(config, store, clock.clone()).expect("valid config");
    LoginFlow::new(Arc::new(guard), provider)
}

fn flow(clock: &ManualClock) -> LoginFlow<MockIdentityProvider, MemoryLockStore> {
    flow_with(GuardConfig::default(), MemoryLockStore::new(), clock, provider())
}

#[tokio::test]
async fn test_correct_password_signs_in() {
    let flow = flow(&ManualClock::default());

    let principal = flow.login(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(principal.email, EMAIL);
    assert_eq!(flow.status(EMAIL).await, LockStatus::Open);
    assert!(flow.current_session().await.unwrap().is_some());
}

#[tokio::test]
async fn test_locked_account_never_reaches_provider() {
    // Arrange
    let clock = ManualClock::default();
    let flow = flow(&clock);
    for _ in 0..3 {
        let _ = flow.login(EMAIL, "wrong").await;
    }
    assert_eq!(flow.provider().authenticate_calls(), 3);

    // Act: the right password while locked, several times
    for _ in 0..5 {
        let err = flow.login(EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, GuardError::Locked { .. }));
    }

    // Assert
    assert_eq!(flow.provider().authenticate_calls(), 3);

    clock.advance(Duration::seconds(900));
    assert!(flow.login(EMAIL, PASSWORD).await.is_ok());
    assert_eq!(flow.provider().authenticate_calls(), 4);
}

#[tokio::test]
async fn test_case_variants_lock_the_same_account() {
    let flow = flow(&ManualClock::default());

    let _ = flow.login("test@test.com", "wrong").await;
    let _ = flow.login("TEST@test.com", "wrong").await;
    let _ = flow.login("  Test@Test.com ", "wrong").await;

    let err = flow.login("tEsT@TeSt.CoM", PASSWORD).await.unwrap_err();
    assert!(matches!(err, GuardError::Locked { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_same_account_submissions_are_queued() {
    let provider = provider().with_latency(std::time::Duration::from_millis(200));
    let flow = Arc::new(flow_with(
        GuardConfig::default(),
        MemoryLockStore::new(),
        &ManualClock::default(),
        provider,
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.login(EMAIL, "wrong").await })
        })
        .collect();

    let mut failed = 0;
    let mut locked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(GuardError::AuthenticationFailed) => failed += 1,
            Err(GuardError::Locked { .. }) => locked += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(flow.provider().max_in_flight(), 1);
    assert_eq!(failed, 3);
    assert_eq!(locked, 1);
    assert_eq!(flow.provider().authenticate_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_flows_sharing_a_guard_never_dispatch_in_parallel() {
    // Arrange: two flows (two tabs) over one guard, one slow provider
    init_test_tracing();
    let provider = provider().with_latency(std::time::Duration::from_millis(200));
    let store = MockLockStore::new().with_latency(std::time::Duration::from_millis(1));
    let guard = Arc::new(
        LockoutGuard::new(
            GuardConfig::new().with_persistence(true),
            store,
            ManualClock::default(),
        )
        .unwrap(),
    );
    let first = Arc::new(LoginFlow::new(Arc::clone(&guard), provider.clone()));
    let second = Arc::new(LoginFlow::new(Arc::clone(&guard), provider.clone()));

    // Act
    let handles: Vec<_> = (0..6)
        .map(|i| {
            let flow = if i % 2 == 0 {
                Arc::clone(&first)
            } else {
                Arc::clone(&second)
            };
            tokio::spawn(async move { flow.login(EMAIL, "wrong").await })
        })
        .collect();

    let mut failed = 0;
    let mut locked = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(GuardError::AuthenticationFailed) => failed += 1,
            Err(GuardError::Locked { .. }) => locked += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // Assert
    assert_eq!(provider.max_in_flight(), 1);
    assert_eq!(provider.authenticate_calls(), 3);
    assert_eq!(failed, 3);
    assert_eq!(locked, 3);
}

#[tokio::test(start_paused = true)]
async fn test_different_accounts_run_concurrently() {
    let provider = provider()
        .with_account("other@test.com", PASSWORD)
        .with_latency(std::time::Duration::from_millis(200));
    let flow = Arc::new(flow_with(
        GuardConfig::default(),
        MemoryLockStore::new(),
        &ManualClock::default(),
        provider,
    ));

    let (a, b) = tokio::join!(flow.login(EMAIL, PASSWORD), flow.login("other@test.com", PASSWORD));

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(flow.provider().max_in_flight(), 2);
}

#[tokio::test]
async fn test_lock_survives_reload() {
    let clock = ManualClock::default();
    let store = MemoryLockStore::new();
    let config = GuardConfig::new().with_persistence(true);

    let first = flow_with(config.clone(), store.clone(), &clock, provider());
    for _ in 0..3 {
        let _ = first.login(EMAIL, "wrong").await;
    }
    drop(first);

    clock.advance(Duration::seconds(60));
    let reloaded = flow_with(config, store, &clock, provider());
    let err = reloaded.login(EMAIL, PASSWORD).await.unwrap_err();

    assert_eq!(
        err,
        GuardError::Locked {
            retry_after_seconds: 840
        }
    );
    assert_eq!(reloaded.provider().authenticate_calls(), 0);
}

#[tokio::test]
async fn test_store_outage_does_not_block_login() {
    let clock = ManualClock::default();
    let store = MockLockStore::new();
    store.set_fail_reads(true);
    store.set_fail_writes(true);
    let flow = flow_with(
        GuardConfig::new().with_persistence(true),
        store,
        &clock,
        provider(),
    );

    assert!(flow.login(EMAIL, PASSWORD).await.is_ok());

    for _ in 0..3 {
        let _ = flow.login(EMAIL, "wrong").await;
    }
    assert!(matches!(
        flow.login(EMAIL, PASSWORD).await,
        Err(GuardError::Locked { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_from_flow() {
    let clock = ManualClock::default();
    let flow = flow_with(
        GuardConfig::new().with_lockout_duration_seconds(3),
        MemoryLockStore::new(),
        &clock,
        provider(),
    );
    for _ in 0..3 {
        let _ = flow.login(EMAIL, "wrong").await;
    }

    let mut countdown = flow
        .countdown(EMAIL, std::time::Duration::from_secs(1))
        .await;
    assert_eq!(countdown.remaining(), 3);

    clock.advance(Duration::seconds(3));
    assert_eq!(countdown.changed().await, Some(0));
    assert!(flow.login(EMAIL, PASSWORD).await.is_ok());
}
