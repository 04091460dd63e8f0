//! Shared utilities for the store implementations.

use std::fmt::Display;

use crate::error::CacheError;

/// Build a composite cache key from a prefix and key.
///
/// Format: `{prefix}::{key}`
pub fn build_cache_key<N: Display>(prefix: &N, key: &str) -> String {
    format!("{}::{}", prefix, key)
}

/// Reject empty keys before they reach a backend.
pub fn ensure_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::EmptyKey);
    }
    Ok(())
}

/// Read a stored value as an unsigned counter.
pub fn parse_counter(key: &str, bytes: &[u8]) -> Result<u64, CacheError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.trim().parse::<u64>().ok())
        .ok_or_else(|| CacheError::not_numeric(key))
}

/// Encode a counter the same way the codec encodes integers.
pub fn encode_counter(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}
