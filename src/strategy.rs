use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::ConfigNode;
use crate::error::CacheError;
use crate::store::Store;

/// Recognizes one store configuration shape and builds stores from it.
///
/// Strategies are stateless apart from construction-time defaults; they own
/// no connections themselves.
#[async_trait]
pub trait StoreStrategy: Send + Sync {
    /// Whether this strategy handles `config`.
    fn accept(&self, config: &ConfigNode) -> bool;

    /// Build a ready-to-use store from `config`.
    async fn create(&self, config: &ConfigNode) -> Result<Arc<dyn Store>, CacheError>;
}

#[derive(Deserialize)]
struct StoreType {
    #[serde(default, rename = "Type", alias = "type")]
    kind: String,
}

/// Match the `Type` discriminator of `config` against `expected`.
///
/// A null node or a missing `Type` is rejected. A node whose discriminator
/// can't be read is accepted, so that `create` reports the parse error
/// through [`check_type`].
pub(crate) fn accepts_type(config: &ConfigNode, expected: &str) -> bool {
    if config.is_null() {
        return false;
    }
    match config.populate::<StoreType>("") {
        Ok(header) => header.kind == expected,
        Err(_) => true,
    }
}

/// First step of every built-in `create`: the node must be present and its
/// `Type` must read as `expected`.
pub(crate) fn check_type(config: &ConfigNode, expected: &str) -> Result<(), CacheError> {
    if config.is_null() {
        return Err(CacheError::NilArgument("config"));
    }

    let header: StoreType = config
        .populate("")
        .map_err(|e| CacheError::invalid_config(config, format!("invalid Type: {}", e)))?;

    if header.kind != expected {
        return Err(CacheError::invalid_config(
            config,
            format!("Type '{}' is not '{}'", header.kind, expected),
        ));
    }
    Ok(())
}
