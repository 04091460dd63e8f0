use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::ConfigNode;
use crate::error::CacheError;
use crate::expiration::{Expiration, normalize_expire};
use crate::settings::CacheSettings;
use crate::store::Store;
use crate::strategy::{StoreStrategy, accepts_type, check_type};
use crate::utils::{encode_counter, ensure_key, parse_counter};

/// Value of the `Type` field selecting [`InMemoryStore`].
pub const IN_MEMORY_STORE_TYPE: &str = "in-memory";

const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for InMemoryStore.
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Expiration applied for [`Expiration::Default`].
    pub default_expiration: Duration,

    /// Minimum time between sweeps of expired entries.
    ///
    /// Sweeps run on writes; reads only drop the entry they touch.
    pub cleanup_interval: Duration,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        InMemoryStoreConfig {
            default_expiration: Duration::from_secs(60),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

#[derive(Clone)]
struct Item {
    value: Vec<u8>,
    expires: Option<Instant>,
}

impl Item {
    /// A TTL too large to represent as an instant never expires.
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let expires = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        Item { value, expires }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

struct State {
    items: HashMap<String, Item>,
    last_cleanup: Instant,
}

/// Thread-safe in-memory cache store using HashMap with RwLock.
///
/// Conditional writes and counters run under the write lock, so each
/// operation is atomic with respect to the others.
pub struct InMemoryStore {
    state: RwLock<State>,
    default_expiration: Duration,
    cleanup_interval: Duration,
}

impl InMemoryStore {
    /// Create a new InMemoryStore with the given configuration.
    pub fn new(config: InMemoryStoreConfig) -> Self {
        InMemoryStore {
            state: RwLock::new(State {
                items: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
            default_expiration: config.default_expiration,
            cleanup_interval: config.cleanup_interval,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ttl(&self, expire: Expiration) -> Duration {
        normalize_expire(expire, self.default_expiration)
    }

    /// Drop expired entries if the cleanup interval has elapsed.
    fn maybe_evict(&self, state: &mut State, now: Instant) {
        if now.duration_since(state.last_cleanup) < self.cleanup_interval {
            return;
        }
        state.items.retain(|_, item| !item.is_expired(now));
        state.last_cleanup = now;
    }

    async fn update_counter<F>(&self, key: &str, apply: F) -> Result<u64, CacheError>
    where
        F: FnOnce(u64) -> u64 + Send,
    {
        ensure_key(key)?;
        let mut state = self.state.write().await;
        let now = Instant::now();

        if state.items.get(key).is_some_and(|item| item.is_expired(now)) {
            state.items.remove(key);
        }
        let Some(item) = state.items.get_mut(key) else {
            return Err(CacheError::miss(key));
        };

        let updated = apply(parse_counter(key, &item.value)?);
        item.value = encode_counter(updated);
        Ok(updated)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn name(&self) -> &'static str {
        IN_MEMORY_STORE_TYPE
    }

    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        ensure_key(key)?;
        let state = self.state.read().await;

        let Some(item) = state.items.get(key) else {
            return Err(CacheError::miss(key));
        };

        if item.is_expired(Instant::now()) {
            // Entry is expired, remove it
            drop(state);
            let mut state = self.state.write().await;
            if state
                .items
                .get(key)
                .is_some_and(|item| item.is_expired(Instant::now()))
            {
                state.items.remove(key);
            }
            return Err(CacheError::miss(key));
        }

        Ok(item.value.clone())
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        let item = Item::new(value, self.ttl(expire));

        let mut state = self.state.write().await;
        state.items.insert(key.to_string(), item);
        self.maybe_evict(&mut state, Instant::now());
        Ok(())
    }

    async fn add_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        let item = Item::new(value, self.ttl(expire));

        let mut state = self.state.write().await;
        let now = Instant::now();
        if state.items.get(key).is_some_and(|item| !item.is_expired(now)) {
            return Err(CacheError::not_stored(key));
        }
        state.items.insert(key.to_string(), item);
        self.maybe_evict(&mut state, now);
        Ok(())
    }

    async fn replace_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        let item = Item::new(value, self.ttl(expire));

        let mut state = self.state.write().await;
        let now = Instant::now();
        match state.items.get_mut(key) {
            Some(current) if !current.is_expired(now) => *current = item,
            _ => return Err(CacheError::not_stored(key)),
        }
        self.maybe_evict(&mut state, now);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        ensure_key(key)?;
        let mut state = self.state.write().await;

        match state.items.remove(key) {
            Some(item) if !item.is_expired(Instant::now()) => Ok(()),
            _ => Err(CacheError::miss(key)),
        }
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, CacheError> {
        self.update_counter(key, |value| value.wrapping_add(delta))
            .await
    }

    async fn decrement(&self, key: &str, delta: u64) -> Result<u64, CacheError> {
        self.update_counter(key, |value| value.saturating_sub(delta))
            .await
    }

    async fn flush(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        state.items.clear();
        state.last_cleanup = Instant::now();
        Ok(())
    }
}

#[derive(Deserialize)]
struct InMemorySection {
    #[serde(
        default,
        rename = "DefaultExpiration",
        alias = "default_expiration",
        alias = "defaultexpiration"
    )]
    default_expiration: Option<u64>,

    #[serde(
        default,
        rename = "CleanupInterval",
        alias = "cleanup_interval",
        alias = "cleanupinterval"
    )]
    cleanup_interval: Option<u64>,
}

/// Builds an [`InMemoryStore`] from a section with `Type = "in-memory"`.
///
/// Recognized fields: `DefaultExpiration` (ms, positive, falls back to the
/// settings default) and `CleanupInterval` (ms).
#[derive(Debug, Clone)]
pub struct InMemoryStoreStrategy {
    default_expiration: Duration,
}

impl InMemoryStoreStrategy {
    pub fn new(default_expiration: Duration) -> Self {
        InMemoryStoreStrategy { default_expiration }
    }
}

impl From<&CacheSettings> for InMemoryStoreStrategy {
    fn from(settings: &CacheSettings) -> Self {
        InMemoryStoreStrategy::new(settings.default_ttl())
    }
}

#[async_trait]
impl StoreStrategy for InMemoryStoreStrategy {
    fn accept(&self, config: &ConfigNode) -> bool {
        accepts_type(config, IN_MEMORY_STORE_TYPE)
    }

    async fn create(&self, config: &ConfigNode) -> Result<Arc<dyn Store>, CacheError> {
        check_type(config, IN_MEMORY_STORE_TYPE)?;

        let section: InMemorySection = config
            .populate("")
            .map_err(|e| CacheError::invalid_config(config, e.to_string()))?;

        let default_expiration = section
            .default_expiration
            .map(Duration::from_millis)
            .unwrap_or(self.default_expiration);
        if default_expiration.is_zero() {
            return Err(CacheError::invalid_config(config, "missing expiration"));
        }

        let cleanup_interval = section
            .cleanup_interval
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CLEANUP_INTERVAL);

        Ok(Arc::new(InMemoryStore::new(InMemoryStoreConfig {
            default_expiration,
            cleanup_interval,
        })))
    }
}
