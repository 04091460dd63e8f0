use crate::config::ConfigNode;

/// Error type for cache operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    /// A required collaborator or argument was not supplied.
    #[error("nil argument: {0}")]
    NilArgument(&'static str),

    /// No configuration section exists for the requested store.
    #[error("cache store config not found: {path}")]
    ConfigNotFound { path: String },

    /// The store configuration is present but could not be turned into a store.
    #[error("invalid cache store config ({config}): {reason}")]
    InvalidConfig { config: String, reason: String },

    /// The configuration manager failed to read or bind a value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The key is not present in the store.
    #[error("cache key not found: {key}")]
    Miss { key: String },

    /// An add/replace precondition was not met.
    #[error("cache element not stored: {key}")]
    NotStored { key: String },

    /// A counter operation hit a value that is not an unsigned integer.
    #[error("cache value for key '{key}' is not an unsigned integer")]
    NotNumeric { key: String },

    #[error("cache key must not be empty")]
    EmptyKey,

    /// Serialization failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Deserialization failed.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A backend operation failed.
    #[error("[{store}] cache error for key '{key}': {message}")]
    Operation {
        store: String,
        key: String,
        message: String,
    },

    /// The store was closed by its pool.
    #[error("[{0}] store is closed")]
    Closed(&'static str),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        store: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            store: store.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(config: &ConfigNode, reason: impl Into<String>) -> Self {
        CacheError::InvalidConfig {
            config: config.to_string(),
            reason: reason.into(),
        }
    }

    pub fn miss(key: impl Into<String>) -> Self {
        CacheError::Miss { key: key.into() }
    }

    pub fn not_stored(key: impl Into<String>) -> Self {
        CacheError::NotStored { key: key.into() }
    }

    pub fn not_numeric(key: impl Into<String>) -> Self {
        CacheError::NotNumeric { key: key.into() }
    }

    /// True when the error reports an absent key.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss { .. })
    }

    /// True when an add/replace precondition failed.
    pub fn is_not_stored(&self) -> bool {
        matches!(self, CacheError::NotStored { .. })
    }
}

impl From<config::ConfigError> for CacheError {
    fn from(err: config::ConfigError) -> Self {
        CacheError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_error_message() {
        let err = CacheError::operation("redis", "user:1", "GET failed: timeout");
        assert_eq!(
            err.to_string(),
            "[redis] cache error for key 'user:1': GET failed: timeout"
        );
    }

    #[test]
    fn test_invalid_config_mentions_config() {
        let node = ConfigNode::new(json!({"Type": "in-memory", "DefaultExpiration": 0}));
        let err = CacheError::invalid_config(&node, "missing expiration");
        let message = err.to_string();
        assert!(message.starts_with("invalid cache store config"));
        assert!(message.contains("in-memory"));
        assert!(message.ends_with("missing expiration"));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(CacheError::miss("k").is_miss());
        assert!(!CacheError::miss("k").is_not_stored());
        assert!(CacheError::not_stored("k").is_not_stored());
    }
}
