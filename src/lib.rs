//! slate-cache - A configuration-driven cache store pool for Rust
//!
//! This library provides:
//! - A uniform async [`Store`] contract over opaque byte values, with typed
//!   access through [`StoreExt`]
//! - In-memory, moka and redis backends
//! - [`StoreStrategy`] recognizers and an ordered [`StoreFactory`] that turn a
//!   configuration section into a store
//! - A [`StorePool`] that creates named stores lazily and drops them all when
//!   the stores configuration changes
//!
//! # Example
//!
//! ```ignore
//! use slate_cache::{CacheSettings, ConfigTree, Expiration, StoreExt, StoreFactory, StorePool};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), slate_cache::CacheError> {
//!     let settings = CacheSettings::from_env()?;
//!
//!     let tree = Arc::new(ConfigTree::default());
//!     tree.set(
//!         &format!("{}.sessions", settings.stores_config_path),
//!         json!({"Type": "in-memory", "DefaultExpiration": 5000}),
//!     );
//!
//!     let pool = StorePool::builder()
//!         .config(tree)
//!         .factory(Arc::new(StoreFactory::with_default_strategies(&settings)))
//!         .settings(settings)
//!         .build()?;
//!
//!     let sessions = pool.get("sessions").await?;
//!     sessions.set("user:123", "alice", Expiration::Default).await?;
//!     let user: String = sessions.get("user:123").await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
mod config;
mod error;
mod expiration;
mod factory;
mod lock;
mod pool;
mod settings;
mod store;
mod strategy;
pub mod stores;
mod utils;

// Re-export public API
pub use crate::config::{ConfigManager, ConfigNode, ConfigTree, Observer};
pub use error::CacheError;
pub use expiration::{Expiration, normalize_expire};
pub use factory::StoreFactory;
pub use pool::{StorePool, StorePoolBuilder};
pub use settings::{CacheSettings, ENV_PREFIX};
pub use store::{Store, StoreExt};
pub use strategy::StoreStrategy;
pub use stores::memory::{InMemoryStore, InMemoryStoreConfig, InMemoryStoreStrategy};
pub use stores::moka::{MokaStore, MokaStoreConfig, MokaStoreStrategy};
pub use stores::redis::{RedisStore, RedisStoreConfig, RedisStoreStrategy};
