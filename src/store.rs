use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::codec;
use crate::error::CacheError;
use crate::expiration::Expiration;

/// A store is a common interface over one cache backend connection.
///
/// Values cross the trait boundary as opaque bytes so the same store can be
/// shared by callers holding different value types. The typed API lives in
/// [`StoreExt`].
///
/// Every operation rejects an empty key with [`CacheError::EmptyKey`] and
/// applies [`normalize_expire`](crate::normalize_expire) before handing the
/// expiration to the backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for tracing and error context.
    ///
    /// # Example
    /// - "in-memory"
    /// - "moka"
    /// - "redis"
    fn name(&self) -> &'static str;

    /// Return the stored bytes, or [`CacheError::Miss`].
    async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Store the value, replacing any existing entry.
    async fn set_bytes(&self, key: &str, value: Vec<u8>, expire: Expiration)
    -> Result<(), CacheError>;

    /// Store the value only if the key is absent or expired.
    ///
    /// Fails with [`CacheError::NotStored`] otherwise.
    async fn add_bytes(&self, key: &str, value: Vec<u8>, expire: Expiration)
    -> Result<(), CacheError>;

    /// Store the value only if the key currently exists.
    ///
    /// Fails with [`CacheError::NotStored`] otherwise.
    async fn replace_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
    ) -> Result<(), CacheError>;

    /// Remove the key, or fail with [`CacheError::Miss`].
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Add `delta` to an unsigned counter and return the new value.
    ///
    /// The entry keeps its expiration. Overflow wraps.
    async fn increment(&self, key: &str, delta: u64) -> Result<u64, CacheError>;

    /// Subtract `delta` from an unsigned counter and return the new value.
    ///
    /// The entry keeps its expiration. The result saturates at zero.
    async fn decrement(&self, key: &str, delta: u64) -> Result<u64, CacheError>;

    /// Remove every entry owned by this store.
    async fn flush(&self) -> Result<(), CacheError>;

    /// Release the backend connection.
    ///
    /// Called by the pool when it drops the store after a configuration
    /// change. Stores without resources to release keep the default.
    fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Typed access on top of [`Store`], encoded with the [`codec`](crate::codec).
#[async_trait]
pub trait StoreExt: Store {
    /// Return the cached value decoded as `T`.
    ///
    /// Fails with [`CacheError::Miss`] for absent keys and
    /// [`CacheError::Decoding`] when the stored value has another shape.
    async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let bytes = self.get_bytes(key).await?;
        codec::deserialize(bytes)
    }

    async fn set<T>(&self, key: &str, value: T, expire: Expiration) -> Result<(), CacheError>
    where
        T: Serialize + Send + 'static,
    {
        let bytes = codec::serialize(value)?;
        self.set_bytes(key, bytes, expire).await
    }

    async fn add<T>(&self, key: &str, value: T, expire: Expiration) -> Result<(), CacheError>
    where
        T: Serialize + Send + 'static,
    {
        let bytes = codec::serialize(value)?;
        self.add_bytes(key, bytes, expire).await
    }

    async fn replace<T>(&self, key: &str, value: T, expire: Expiration) -> Result<(), CacheError>
    where
        T: Serialize + Send + 'static,
    {
        let bytes = codec::serialize(value)?;
        self.replace_bytes(key, bytes, expire).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
