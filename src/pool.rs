//! Name-keyed pool of lazily created stores.
//!
//! The pool resolves a store name to the configuration section at
//! `{stores_config_path}.{name}`, builds the store through a
//! [`StoreFactory`] on first use, and caches it. Any change under the stores
//! path closes and forgets every cached store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::{ConfigManager, Observer};
use crate::error::CacheError;
use crate::factory::StoreFactory;
use crate::lock::recover;
use crate::settings::CacheSettings;
use crate::store::Store;

/// Builder for [`StorePool`].
///
/// # Example
///
/// ```ignore
/// use slate_cache::{CacheSettings, ConfigTree, StoreFactory, StorePool};
/// use std::sync::Arc;
///
/// let settings = CacheSettings::from_env()?;
/// let pool = StorePool::builder()
///     .config(Arc::new(ConfigTree::default()))
///     .factory(Arc::new(StoreFactory::with_default_strategies(&settings)))
///     .settings(settings)
///     .build()?;
///
/// let sessions = pool.get("sessions").await?;
/// ```
#[derive(Default)]
pub struct StorePoolBuilder {
    config: Option<Arc<dyn ConfigManager>>,
    factory: Option<Arc<StoreFactory>>,
    settings: CacheSettings,
}

impl StorePoolBuilder {
    pub fn new() -> Self {
        StorePoolBuilder::default()
    }

    /// Configuration manager holding the store sections.
    pub fn config(mut self, config: Arc<dyn ConfigManager>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn factory(mut self, factory: Arc<StoreFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Stores path and observation flag. Defaults to [`CacheSettings::default`].
    pub fn settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the pool, registering the invalidation observer when
    /// `observe_config` is set.
    ///
    /// # Returns
    /// * `Ok(StorePool)` - Ready pool, with no store created yet
    /// * `Err(CacheError::NilArgument)` - Config manager or factory missing
    /// * `Err(_)` - The config manager refused the observer
    pub fn build(self) -> Result<StorePool, CacheError> {
        let config = self.config.ok_or(CacheError::NilArgument("config manager"))?;
        let factory = self.factory.ok_or(CacheError::NilArgument("factory"))?;

        let inner = Arc::new(PoolInner {
            config,
            factory,
            stores_path: self.settings.stores_config_path,
            state: Mutex::new(PoolState::default()),
        });

        if self.settings.observe_config {
            let weak: Weak<PoolInner> = Arc::downgrade(&inner);
            let observer: Observer = Arc::new(move |_old: &Value, _new: &Value| {
                if let Some(inner) = weak.upgrade() {
                    inner.invalidate();
                }
            });
            inner.config.add_observer(&inner.stores_path, observer)?;
        }

        Ok(StorePool { inner })
    }
}

/// Lazily instantiated stores, keyed by name.
///
/// Cloning is cheap and every clone shares the same cached instances.
#[derive(Clone)]
pub struct StorePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: Arc<dyn ConfigManager>,
    factory: Arc<StoreFactory>,
    stores_path: String,
    state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
    instances: HashMap<String, Arc<dyn Store>>,
    /// One creation lock per name being resolved.
    flights: HashMap<String, Arc<AsyncMutex<()>>>,
    /// Bumped by every invalidation.
    generation: u64,
}

impl StorePool {
    pub fn builder() -> StorePoolBuilder {
        StorePoolBuilder::new()
    }

    /// Return the store configured under `name`, creating it on first use.
    ///
    /// Concurrent first calls for the same name create a single store.
    /// Failures are returned as-is and not cached, so the next call retries.
    ///
    /// # Errors
    /// * [`CacheError::ConfigNotFound`] - no section at `{stores_path}.{name}`
    /// * errors of the config manager and of the factory, unchanged
    pub async fn get(&self, name: &str) -> Result<Arc<dyn Store>, CacheError> {
        if let Some(store) = self.inner.cached(name) {
            return Ok(store);
        }

        let flight = self.inner.flight(name);
        let result = {
            let _guard = flight.lock().await;
            self.inner.resolve(name).await
        };
        self.inner.release_flight(name, &flight);
        result
    }

    /// Close and forget every cached store.
    ///
    /// This is what the configuration observer runs. Close failures are
    /// logged and skipped.
    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    /// Whether a store for `name` is currently cached.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.cached(name).is_some()
    }

    /// Number of cached stores.
    pub fn len(&self) -> usize {
        recover(self.inner.state.lock(), "pool.len").instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stores_path(&self) -> &str {
        &self.inner.stores_path
    }
}

impl PoolInner {
    fn cached(&self, name: &str) -> Option<Arc<dyn Store>> {
        recover(self.state.lock(), "pool.cached")
            .instances
            .get(name)
            .cloned()
    }

    fn flight(&self, name: &str) -> Arc<AsyncMutex<()>> {
        recover(self.state.lock(), "pool.flight")
            .flights
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Drop the flight lock once nobody else is waiting on it.
    fn release_flight(&self, name: &str, flight: &Arc<AsyncMutex<()>>) {
        let mut state = recover(self.state.lock(), "pool.release_flight");
        let idle = state
            .flights
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, flight) && Arc::strong_count(current) == 2);
        if idle {
            state.flights.remove(name);
        }
    }

    /// Create and cache the store for `name`. Caller holds the flight lock.
    async fn resolve(&self, name: &str) -> Result<Arc<dyn Store>, CacheError> {
        loop {
            let generation = {
                let state = recover(self.state.lock(), "pool.resolve");
                if let Some(store) = state.instances.get(name) {
                    return Ok(store.clone());
                }
                state.generation
            };

            let store = self.create(name).await?;

            let cached = {
                let mut state = recover(self.state.lock(), "pool.resolve");
                let current = state.generation == generation;
                if current {
                    state.instances.insert(name.to_string(), store.clone());
                }
                current
            };

            if cached {
                tracing::debug!(
                    store = name,
                    backend = store.name(),
                    path = %self.stores_path,
                    "Created cache store"
                );
                return Ok(store);
            }

            // The stores config changed while this one was being built.
            tracing::debug!(store = name, "Discarding cache store built from stale config");
            close_store(name, store.as_ref());
        }
    }

    async fn create(&self, name: &str) -> Result<Arc<dyn Store>, CacheError> {
        let path = format!("{}.{}", self.stores_path, name);
        if name.is_empty() || !self.config.has(&path) {
            return Err(CacheError::ConfigNotFound { path });
        }

        let node = self.config.config(&path)?;
        self.factory.create(&node).await
    }

    fn invalidate(&self) {
        let stores: Vec<(String, Arc<dyn Store>)> = {
            let mut state = recover(self.state.lock(), "pool.invalidate");
            state.generation = state.generation.wrapping_add(1);
            state.instances.drain().collect()
        };

        tracing::debug!(
            path = %self.stores_path,
            count = stores.len(),
            "Invalidating cache stores"
        );

        for (name, store) in stores {
            close_store(&name, store.as_ref());
        }
    }
}

fn close_store(name: &str, store: &dyn Store) {
    if let Err(e) = store.close() {
        tracing::warn!(
            "Failed to close cache store: store={}, backend={}, error={}",
            name,
            store.name(),
            e
        );
    }
}
