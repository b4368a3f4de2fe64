//! Scripted walkthrough of the login guard.
//!
//! Signs in against an in-memory identity provider, fails three times,
//! shows the lockout and its countdown, then unlocks and signs in.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p login-guard-demo
//! ```
//!
//! With durable lock state:
//!
//! ```bash
//! LOGIN_GUARD_PERSISTENCE=true LOGIN_GUARD_REDIS_URL=redis://127.0.0.1:6379 \
//!     cargo run -p login-guard-demo
//! ```

use anyhow::Context;
use login_guard::mocks::MockIdentityProvider;
use login_guard::providers::LockStore;
use login_guard::stores::{MemoryLockStore, RedisLockStore};
use login_guard::{GuardConfig, LockStatus, LockoutGuard, LoginFlow};
use login_guard_core::environment::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_EMAIL: &str = "test@test.com";
const DEMO_PASSWORD: &str = "Test123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "login_guard=info,lockout_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GuardConfig::from_env().context("reading LOGIN_GUARD_* configuration")?;
    let provider = MockIdentityProvider::new().with_account(DEMO_EMAIL, DEMO_PASSWORD);

    match config.redis_url.clone() {
        Some(url) if config.persistence_enabled => {
            let store = RedisLockStore::new(&url)
                .await
                .with_context(|| format!("connecting to {url}"))?;
            tracing::info!("Using Redis lock store");
            run(config, store, provider).await
        }
        _ => {
            if config.persistence_enabled {
                tracing::warn!("Persistence enabled without LOGIN_GUARD_REDIS_URL, using memory");
            }
            run(config, MemoryLockStore::new(), provider).await
        }
    }
}

async fn run<S: LockStore + 'static>(
    config: GuardConfig,
    store: S,
    provider: MockIdentityProvider,
) -> anyhow::Result<()> {
    let threshold = config.threshold;
    let guard = Arc::new(LockoutGuard::new(config, store, SystemClock)?);
    let flow = LoginFlow::new(Arc::clone(&guard), provider);

    println!("=== Login Guard Demo ===\n");

    println!(">>> Injection attempt");
    report(flow.login(DEMO_EMAIL, "' OR '1'='1").await);

    println!("\n>>> {threshold} wrong passwords");
    for _ in 0..threshold {
        report(flow.login(DEMO_EMAIL, "wrong-password").await);
        print_status(flow.status(DEMO_EMAIL).await);
    }

    println!("\n>>> Correct password while locked (mixed case)");
    report(flow.login("TEST@test.com", DEMO_PASSWORD).await);

    println!("\n>>> Countdown");
    let mut countdown = flow.countdown(DEMO_EMAIL, Duration::from_secs(1)).await;
    println!("  {}s remaining", countdown.remaining());
    for _ in 0..2 {
        if let Some(left) = countdown.changed().await {
            println!("  {left}s remaining");
        }
    }
    countdown.cancel();

    println!("\n>>> Administrative reset");
    guard.reset(DEMO_EMAIL).await;
    print_status(flow.status(DEMO_EMAIL).await);

    println!("\n>>> Correct password");
    report(flow.login(DEMO_EMAIL, DEMO_PASSWORD).await);
    if let Some(session) = flow.current_session().await? {
        println!(
            "  Signed in as {} (session expires {})",
            session.principal.email, session.expires_at
        );
    }

    flow.sign_out().await?;
    println!("\n=== Signed out ===");
    Ok(())
}

fn report(result: login_guard::Result<login_guard::Principal>) {
    match result {
        Ok(principal) => println!("  OK: {}", principal.email),
        Err(e) => println!("  Rejected: {}", e.user_message()),
    }
}

fn print_status(status: LockStatus) {
    match status {
        LockStatus::Open => println!("  Status: open"),
        LockStatus::Warning {
            failed_count,
            remaining_attempts,
        } => println!("  Status: {failed_count} failed, {remaining_attempts} left"),
        LockStatus::Locked {
            retry_after_seconds,
            ..
        } => println!("  Status: locked for {retry_after_seconds}s"),
    }
}
