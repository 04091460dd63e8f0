use std::sync::Arc;

use crate::config::ConfigNode;
use crate::error::CacheError;
use crate::settings::CacheSettings;
use crate::store::Store;
use crate::strategy::StoreStrategy;
use crate::stores::{InMemoryStoreStrategy, MokaStoreStrategy, RedisStoreStrategy};

/// Ordered registry of [`StoreStrategy`] values.
///
/// `create` asks each strategy in registration order and hands the config to
/// the first one that accepts it. That strategy's result is final, even when
/// it is an error.
#[derive(Default, Clone)]
pub struct StoreFactory {
    strategies: Vec<Arc<dyn StoreStrategy>>,
}

impl StoreFactory {
    pub fn new() -> Self {
        StoreFactory::default()
    }

    /// Factory with the built-in backends: in-memory, moka, then redis.
    pub fn with_default_strategies(settings: &CacheSettings) -> Self {
        StoreFactory::new()
            .with_strategy(Arc::new(InMemoryStoreStrategy::from(settings)))
            .with_strategy(Arc::new(MokaStoreStrategy::from(settings)))
            .with_strategy(Arc::new(RedisStoreStrategy::from(settings)))
    }

    /// Append a strategy. Earlier registrations are tried first.
    pub fn register(&mut self, strategy: Arc<dyn StoreStrategy>) {
        self.strategies.push(strategy);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_strategy(mut self, strategy: Arc<dyn StoreStrategy>) -> Self {
        self.register(strategy);
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn create(&self, config: &ConfigNode) -> Result<Arc<dyn Store>, CacheError> {
        if config.is_null() {
            return Err(CacheError::NilArgument("config"));
        }

        match self.strategies.iter().find(|s| s.accept(config)) {
            Some(strategy) => strategy.create(config).await,
            None => Err(CacheError::invalid_config(
                config,
                "no registered strategy accepts it",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedStrategy {
        accepts: bool,
        result: Result<Arc<dyn Store>, CacheError>,
        accept_calls: AtomicUsize,
        create_calls: AtomicUsize,
    }

    impl FixedStrategy {
        fn new(accepts: bool, result: Result<Arc<dyn Store>, CacheError>) -> Arc<Self> {
            Arc::new(FixedStrategy {
                accepts,
                result,
                accept_calls: AtomicUsize::new(0),
                create_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl StoreStrategy for FixedStrategy {
        fn accept(&self, _config: &ConfigNode) -> bool {
            self.accept_calls.fetch_add(1, Ordering::SeqCst);
            self.accepts
        }

        async fn create(&self, _config: &ConfigNode) -> Result<Arc<dyn Store>, CacheError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn memory_store() -> Arc<dyn Store> {
        Arc::new(InMemoryStore::new(Default::default()))
    }

    fn any_config() -> ConfigNode {
        ConfigNode::new(json!({"Type": "whatever"}))
    }

    #[tokio::test]
    async fn test_first_accepting_strategy_wins() {
        let store_a = memory_store();
        let store_b = memory_store();
        let s1 = FixedStrategy::new(false, Ok(memory_store()));
        let s2 = FixedStrategy::new(true, Ok(store_a.clone()));
        let s3 = FixedStrategy::new(true, Ok(store_b));

        let factory = StoreFactory::new()
            .with_strategy(s1.clone())
            .with_strategy(s2.clone())
            .with_strategy(s3.clone());

        let created = factory.create(&any_config()).await.unwrap();
        assert!(Arc::ptr_eq(&created, &store_a));
        assert_eq!(s1.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(s2.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(s3.accept_calls.load(Ordering::SeqCst), 0);
        assert_eq!(s3.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepting_strategy_error_is_final() {
        let failing = FixedStrategy::new(
            true,
            Err(CacheError::InvalidConfig {
                config: "{}".to_string(),
                reason: "missing expiration".to_string(),
            }),
        );
        let fallback = FixedStrategy::new(true, Ok(memory_store()));
        let factory = StoreFactory::new()
            .with_strategy(failing)
            .with_strategy(fallback.clone());

        let err = factory.create(&any_config()).await.err().unwrap();
        assert!(matches!(err, CacheError::InvalidConfig { ref reason, .. } if reason == "missing expiration"));
        assert_eq!(fallback.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_accepting_strategy() {
        let factory = StoreFactory::new()
            .with_strategy(FixedStrategy::new(false, Ok(memory_store())))
            .with_strategy(FixedStrategy::new(false, Ok(memory_store())));

        let err = factory.create(&any_config()).await.err().unwrap();
        assert!(matches!(err, CacheError::InvalidConfig { .. }));

        let empty = StoreFactory::new();
        assert!(matches!(
            empty.create(&any_config()).await,
            Err(CacheError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_null_config_is_nil_argument() {
        let strategy = FixedStrategy::new(true, Ok(memory_store()));
        let factory = StoreFactory::new().with_strategy(strategy.clone());

        let err = factory.create(&ConfigNode::null()).await.err().unwrap();
        assert_eq!(err, CacheError::NilArgument("config"));
        assert_eq!(strategy.accept_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_strategies_dispatch_on_type() {
        let settings = CacheSettings {
            default_expiration: 1_000,
            ..CacheSettings::default()
        };
        let factory = StoreFactory::with_default_strategies(&settings);
        assert_eq!(factory.len(), 3);

        let memory = factory
            .create(&ConfigNode::new(json!({"Type": "in-memory"})))
            .await
            .unwrap();
        assert_eq!(memory.name(), "in-memory");

        let moka = factory
            .create(&ConfigNode::new(json!({"Type": "moka", "MaxCapacity": 100})))
            .await
            .unwrap();
        assert_eq!(moka.name(), "moka");

        assert!(matches!(
            factory
                .create(&ConfigNode::new(json!({"Type": "memcached"})))
                .await,
            Err(CacheError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_type_is_reported_not_built() {
        let factory = StoreFactory::with_default_strategies(&CacheSettings::default());

        for config in [
            json!({"Type": 3, "DefaultExpiration": 5000}),
            json!({"Type": {"name": "in-memory"}}),
            json!("in-memory"),
        ] {
            let err = factory.create(&ConfigNode::new(config)).await.err().unwrap();
            assert!(
                matches!(err, CacheError::InvalidConfig { ref reason, .. } if reason.starts_with("invalid Type")),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn test_register_preserves_order() {
        let mut factory = StoreFactory::new();
        assert!(factory.is_empty());
        factory.register(FixedStrategy::new(false, Ok(memory_store())));
        factory.register(Arc::new(InMemoryStoreStrategy::new(Duration::from_secs(1))));
        assert_eq!(factory.len(), 2);
    }
}
