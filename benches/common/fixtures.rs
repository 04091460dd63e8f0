use serde::{Deserialize, Serialize};
use serde_json::json;
use slate_cache::ConfigTree;
use std::sync::Arc;

/// Test data structure for benchmarks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchSession {
    pub user_id: u64,
    pub token: String,
    pub scopes: Vec<String>,
}

impl BenchSession {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            token: format!("token-{:016x}", user_id.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
            scopes: vec!["read".to_string(), "write".to_string()],
        }
    }
}

/// Stores section with one store per backend under `bench.stores`.
pub fn stores_tree(redis_url: &str) -> Arc<ConfigTree> {
    Arc::new(ConfigTree::new(json!({
        "bench": {
            "stores": {
                "memory": {"Type": "in-memory", "DefaultExpiration": 300_000},
                "moka": {"Type": "moka", "DefaultExpiration": 300_000, "MaxCapacity": 100_000},
                "redis": {
                    "Type": "redis",
                    "Url": redis_url,
                    "Prefix": "slate-bench",
                    "DefaultExpiration": 300_000
                }
            }
        }
    })))
}

/// Generate test keys for different workload patterns
pub struct KeyGenerator {
    num_keys: usize,
}

impl KeyGenerator {
    pub fn new(num_keys: usize) -> Self {
        Self { num_keys }
    }

    /// Generate sequential keys
    pub fn sequential(&self) -> Vec<String> {
        (0..self.num_keys).map(|i| format!("session:{}", i)).collect()
    }

    /// Keys where `hit_ratio` of them fall inside the populated range.
    pub fn mixed(&self, hit_ratio: f64) -> Vec<String> {
        let hits = (self.num_keys as f64 * hit_ratio) as usize;
        (0..self.num_keys)
            .map(|i| {
                if i < hits {
                    format!("session:{}", i)
                } else {
                    format!("session:{}", self.num_keys + i)
                }
            })
            .collect()
    }
}
