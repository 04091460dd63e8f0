//! Example wiring a store pool to a configuration tree.
//!
//! Stores are declared as configuration sections and created on first use.
//! Changing the stores section drops every cached store, so the next lookup
//! picks up the new backend.
//!
//! Run with `RUST_LOG=slate_cache=debug cargo run --example store_pool` to see
//! the pool's creation and invalidation events. `SLATE_CACHE_*` variables
//! override the settings.

use serde::{Deserialize, Serialize};
use serde_json::json;
use slate_cache::{CacheSettings, ConfigTree, Expiration, StoreExt, StoreFactory, StorePool};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    token: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = CacheSettings::from_env()?;
    let stores = settings.stores_config_path.clone();

    let tree = Arc::new(ConfigTree::default());
    tree.set(
        &format!("{}.sessions", stores),
        json!({"Type": "in-memory", "DefaultExpiration": 5000}),
    );
    tree.set(
        &format!("{}.pages", stores),
        json!({"Type": "moka", "MaxCapacity": 10_000}),
    );

    let pool = StorePool::builder()
        .config(tree.clone())
        .factory(Arc::new(StoreFactory::with_default_strategies(&settings)))
        .settings(settings)
        .build()?;

    let sessions = pool.get("sessions").await?;
    sessions
        .set(
            "session:42",
            Session {
                user_id: 42,
                token: "c0ffee".to_string(),
            },
            Expiration::Default,
        )
        .await?;
    let session: Session = sessions.get("session:42").await?;
    println!("[{}] session:42 -> {:?}", sessions.name(), session);

    let pages = pool.get("pages").await?;
    pages.add("views", 0u64, Expiration::Forever).await?;
    for _ in 0..3 {
        pages.increment("views", 1).await?;
    }
    println!("[{}] views -> {}", pages.name(), pages.get::<u64>("views").await?);

    if let Err(e) = sessions.add("session:42", "dup", Expiration::Default).await {
        println!("add on existing key: {}", e);
    }

    // Short-lived entry
    sessions
        .set("otp", "123456", Duration::from_millis(100).into())
        .await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    if let Err(e) = sessions.get::<String>("otp").await {
        println!("otp after 200ms: {}", e);
    }

    // Swap the sessions backend; the pool rebuilds on next access
    tree.set(
        &format!("{}.sessions", stores),
        json!({"Type": "moka", "DefaultExpiration": 5000}),
    );
    println!("cached stores after config change: {}", pool.len());

    let sessions = pool.get("sessions").await?;
    println!("sessions now backed by {}", sessions.name());

    match pool.get("missing").await {
        Ok(_) => println!("unexpected store"),
        Err(e) => println!("lookup of unknown store: {}", e),
    }

    Ok(())
}
