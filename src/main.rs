//! Action Cache demo
//!
//! Runs a simulated slow store action through the cache and logs how each
//! call was served.

use std::time::Duration;

use anyhow::{bail, Context};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use action_cache::tasks::spawn_configured_cleanup;
use action_cache::{dispatcher_fn, ActionCache, CacheConfig, DispatchOptions};

/// Simulated latency of the host store's action.
const FETCH_LATENCY: Duration = Duration::from_millis(200);

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache in front of a simulated dispatcher
/// 4. Start the expired-entry sweep if configured
/// 5. Run concurrent, repeated and invalidated dispatches
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "action_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: timeout={:?}ms, action_timeouts={:?}, cleanup_interval={:?}ms",
        config.timeout, config.action_timeouts, config.cleanup_interval
    );

    let dispatcher = dispatcher_fn(|action: &str, payload: Option<Value>| {
        let action = action.to_string();
        async move {
            tokio::time::sleep(FETCH_LATENCY).await;
            info!(action = %action, "Underlying dispatch executed");
            match payload.as_ref().and_then(|p| p["id"].as_u64()) {
                Some(id) => Ok(json!({ "id": id, "name": format!("user-{}", id) })),
                None => Err(format!("{} requires an id", action)),
            }
        }
    });
    let cache = ActionCache::new(dispatcher, config);
    let cleanup_handle = spawn_configured_cleanup(&cache);

    let payload = json!({ "id": 1 });
    let options = DispatchOptions::with_timeout(1000);

    let concurrent = join_all(
        (0..3).map(|_| cache.dispatch("fetchUser", Some(payload.clone()), options)),
    )
    .await;
    for result in &concurrent {
        info!("Concurrent result: {:?}", result);
    }

    let cached = cache.dispatch("fetchUser", Some(payload.clone()), options).await;
    info!("Repeated result: {:?}", cached);

    if cache.dispatch("fetchUser", None, options).await.is_ok() {
        bail!("dispatch without an id unexpectedly succeeded");
    }
    let cached = cache.has("fetchUser", None).await;
    info!(cached, "Failed dispatch not cached");

    let removed = cache.clear_type("fetchUser").await;
    info!(removed, "Cleared fetchUser entries");

    let stats = cache.stats().await;
    info!(
        "Cache stats: {}",
        serde_json::to_string(&stats).context("serializing cache stats")?
    );

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }

    Ok(())
}
