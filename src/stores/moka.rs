use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use serde::Deserialize;
use std::future::ready;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ConfigNode;
use crate::error::CacheError;
use crate::expiration::{Expiration, normalize_expire};
use crate::settings::CacheSettings;
use crate::store::Store;
use crate::strategy::{StoreStrategy, accepts_type, check_type};
use crate::utils::{encode_counter, ensure_key, parse_counter};

/// Value of the `Type` field selecting [`MokaStore`].
pub const MOKA_STORE_TYPE: &str = "moka";

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Configuration for MokaStore.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,

    /// Expiration applied for [`Expiration::Default`].
    pub default_expiration: Duration,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        MokaStoreConfig {
            max_capacity: DEFAULT_MAX_CAPACITY,
            default_expiration: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
struct Item {
    value: Arc<Vec<u8>>,
    expires: Option<Instant>,
}

impl Item {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let expires = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        Item {
            value: Arc::new(value),
            expires,
        }
    }

    fn is_live(&self) -> bool {
        self.expires.is_none_or(|at| at > Instant::now())
    }

    fn remaining(&self) -> Option<Duration> {
        self.expires
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Per-entry expiration driven by the deadline stored in each item.
struct ItemExpiry;

impl Expiry<String, Item> for ItemExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Item,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.remaining()
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Item,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.remaining()
    }
}

/// High-performance concurrent cache store using Moka.
///
/// MokaStore provides:
/// - Lock-free concurrent access for reads and writes
/// - Size-bounded eviction with per-entry expiration
/// - Atomic conditional writes and counters through Moka's compute API
pub struct MokaStore {
    cache: Cache<String, Item>,
    default_expiration: Duration,
}

impl MokaStore {
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let config = MokaStoreConfig {
    ///     max_capacity: 10_000,
    ///     default_expiration: Duration::from_secs(300),
    /// };
    /// let store = MokaStore::new(config);
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(ItemExpiry)
            .build();

        MokaStore {
            cache,
            default_expiration: config.default_expiration,
        }
    }

    fn item(&self, value: Vec<u8>, expire: Expiration) -> Item {
        Item::new(value, normalize_expire(expire, self.default_expiration))
    }

    async fn update_counter<F>(&self, key: &str, apply: F) -> Result<u64, CacheError>
    where
        F: FnOnce(u64) -> u64 + Send,
    {
        ensure_key(key)?;
        let mut outcome = Err(CacheError::miss(key));

        self.cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current.map(|entry| entry.into_value()) {
                    Some(item) if item.is_live() => match parse_counter(key, &item.value) {
                        Ok(value) => {
                            let updated = apply(value);
                            outcome = Ok(updated);
                            Op::Put(Item {
                                value: Arc::new(encode_counter(updated)),
                                expires: item.expires,
                            })
                        }
                        Err(err) => {
                            outcome = Err(err);
                            Op::Nop
                        }
                    },
                    _ => Op::Nop,
                };
                ready(op)
            })
            .await;

        outcome
    }
}

#[async_trait]
impl Store for MokaStore {
    fn name(&self) -> &'static str {
        MOKA_STORE_TYPE
    }

    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        ensure_key(key)?;

        match self.cache.get(key).await {
            Some(item) if item.is_live() => Ok(item.value.as_ref().clone()),
            _ => Err(CacheError::miss(key)),
        }
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        self.cache
            .insert(key.to_string(), self.item(value, expire))
            .await;
        Ok(())
    }

    async fn add_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        let item = self.item(value, expire);

        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().is_live() => Op::Nop,
                    _ => Op::Put(item),
                };
                ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(_) | CompResult::ReplacedWith(_) => Ok(()),
            _ => Err(CacheError::not_stored(key)),
        }
    }

    async fn replace_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError> {
        ensure_key(key)?;
        let item = self.item(value, expire);

        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().is_live() => Op::Put(item),
                    _ => Op::Nop,
                };
                ready(op)
            })
            .await;

        match result {
            CompResult::ReplacedWith(_) => Ok(()),
            _ => Err(CacheError::not_stored(key)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        ensure_key(key)?;

        match self.cache.remove(key).await {
            Some(item) if item.is_live() => Ok(()),
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
        self.cache.invalidate_all();
        Ok(())
    }
}

#[derive(Deserialize)]
struct MokaSection {
    #[serde(
        default,
        rename = "DefaultExpiration",
        alias = "default_expiration",
        alias = "defaultexpiration"
    )]
    default_expiration: Option<u64>,

    #[serde(
        default,
        rename = "MaxCapacity",
        alias = "max_capacity",
        alias = "maxcapacity"
    )]
    max_capacity: Option<u64>,
}

/// Builds a [`MokaStore`] from a section with `Type = "moka"`.
///
/// Recognized fields: `DefaultExpiration` (ms, positive, falls back to the
/// settings default) and `MaxCapacity` (entries, positive, default 10000).
#[derive(Debug, Clone)]
pub struct MokaStoreStrategy {
    default_expiration: Duration,
}

impl MokaStoreStrategy {
    pub fn new(default_expiration: Duration) -> Self {
        MokaStoreStrategy { default_expiration }
    }
}

impl From<&CacheSettings> for MokaStoreStrategy {
    fn from(settings: &CacheSettings) -> Self {
        MokaStoreStrategy::new(settings.default_ttl())
    }
}

#[async_trait]
impl StoreStrategy for MokaStoreStrategy {
    fn accept(&self, config: &ConfigNode) -> bool {
        accepts_type(config, MOKA_STORE_TYPE)
    }

    async fn create(&self, config: &ConfigNode) -> Result<Arc<dyn Store>, CacheError> {
        check_type(config, MOKA_STORE_TYPE)?;

        let section: MokaSection = config
            .populate("")
            .map_err(|e| CacheError::invalid_config(config, e.to_string()))?;

        let default_expiration = section
            .default_expiration
            .map(Duration::from_millis)
            .unwrap_or(self.default_expiration);
        if default_expiration.is_zero() {
            return Err(CacheError::invalid_config(config, "missing expiration"));
        }

        let max_capacity = section.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY);
        if max_capacity == 0 {
            return Err(CacheError::invalid_config(config, "max capacity must be positive"));
        }

        Ok(Arc::new(MokaStore::new(MokaStoreConfig {
            max_capacity,
            default_expiration,
        })))
    }
}
