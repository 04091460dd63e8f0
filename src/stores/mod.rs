//! Store implementations for the cache library.

pub mod memory;
pub mod moka;
pub mod redis;

pub use memory::{IN_MEMORY_STORE_TYPE, InMemoryStore, InMemoryStoreConfig, InMemoryStoreStrategy};
pub use moka::{MOKA_STORE_TYPE, MokaStore, MokaStoreConfig, MokaStoreStrategy};
pub use redis::{REDIS_STORE_TYPE, RedisStore, RedisStoreConfig, RedisStoreStrategy};
