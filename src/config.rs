//! Configuration collaborator consumed by the store pool.
//!
//! The pool only needs three things from configuration: whether a path
//! exists, a snapshot of the node at a path, and a callback when a subtree
//! changes. [`ConfigManager`] captures that contract; [`ConfigTree`] is an
//! in-memory implementation over a JSON document that can be loaded from any
//! `config` crate source stack.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::CacheError;
use crate::lock::recover;

/// Callback fired with the old and new value of an observed subtree.
pub type Observer = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

/// Read access to a configuration tree addressed by dotted paths.
pub trait ConfigManager: Send + Sync {
    /// Whether a value exists at `path`.
    fn has(&self, path: &str) -> bool;

    /// Snapshot of the node at `path`.
    fn config(&self, path: &str) -> Result<ConfigNode, CacheError>;

    /// Register `observer` to run whenever the value rooted at `path` changes.
    fn add_observer(&self, path: &str, observer: Observer) -> Result<(), CacheError>;
}

/// An owned snapshot of one configuration subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    value: Value,
}

impl ConfigNode {
    pub fn new(value: Value) -> Self {
        ConfigNode { value }
    }

    /// A node holding nothing. Factories treat it as an absent config.
    pub fn null() -> Self {
        ConfigNode { value: Value::Null }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Bind the subtree at `subpath` (empty for the node itself) to `T`.
    pub fn populate<T>(&self, subpath: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        let value = lookup(&self.value, subpath)
            .ok_or_else(|| CacheError::Config(format!("path '{}' not found", subpath)))?;
        T::deserialize(value).map_err(|e| CacheError::Config(e.to_string()))
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<Value> for ConfigNode {
    fn from(value: Value) -> Self {
        ConfigNode::new(value)
    }
}

struct Watch {
    path: String,
    observer: Observer,
}

/// Thread-safe, observable configuration tree.
///
/// Mutations compare every observed subtree before and after the change and
/// fire the observers whose subtree differs. Observers run after the tree
/// lock is released, so they may read the tree again.
#[derive(Default)]
pub struct ConfigTree {
    root: RwLock<Value>,
    watches: Mutex<Vec<Arc<Watch>>>,
}

impl ConfigTree {
    pub fn new(root: Value) -> Self {
        ConfigTree {
            root: RwLock::new(root),
            watches: Mutex::new(Vec::new()),
        }
    }

    /// Build a tree from a `config` crate source stack (files, environment).
    pub fn from_config(config: config::Config) -> Result<Self, CacheError> {
        let root: Value = config.try_deserialize()?;
        Ok(ConfigTree::new(root))
    }

    /// Clone of the value at `path`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = recover(self.root.read(), "config.get");
        lookup(&root, path).cloned()
    }

    /// Set the value at `path`, creating intermediate objects as needed.
    pub fn set(&self, path: &str, value: Value) {
        self.mutate(|root| assign(root, path, value));
    }

    /// Replace the whole document, e.g. after reloading sources.
    pub fn replace(&self, root: Value) {
        self.mutate(|current| *current = root);
    }

    /// Remove the value at `path`. Returns the removed value, if any.
    pub fn remove(&self, path: &str) -> Option<Value> {
        let mut removed = None;
        self.mutate(|root| removed = detach(root, path));
        removed
    }

    fn mutate<F>(&self, change: F)
    where
        F: FnOnce(&mut Value),
    {
        let watches: Vec<Arc<Watch>> = recover(self.watches.lock(), "config.mutate").clone();

        let fired: Vec<(Arc<Watch>, Value, Value)> = {
            let mut root = recover(self.root.write(), "config.mutate");
            let before: Vec<Value> = watches
                .iter()
                .map(|w| lookup(&root, &w.path).cloned().unwrap_or(Value::Null))
                .collect();

            change(&mut *root);

            watches
                .into_iter()
                .zip(before)
                .filter_map(|(watch, old)| {
                    let new = lookup(&root, &watch.path).cloned().unwrap_or(Value::Null);
                    (old != new).then_some((watch, old, new))
                })
                .collect()
        };

        for (watch, old, new) in fired {
            (watch.observer)(&old, &new);
        }
    }
}

impl ConfigManager for ConfigTree {
    fn has(&self, path: &str) -> bool {
        let root = recover(self.root.read(), "config.has");
        lookup(&root, path).is_some()
    }

    fn config(&self, path: &str) -> Result<ConfigNode, CacheError> {
        self.get(path)
            .map(ConfigNode::new)
            .ok_or_else(|| CacheError::Config(format!("path '{}' not found", path)))
    }

    fn add_observer(&self, path: &str, observer: Observer) -> Result<(), CacheError> {
        recover(self.watches.lock(), "config.add_observer").push(Arc::new(Watch {
            path: path.to_string(),
            observer,
        }));
        Ok(())
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn assign(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    for segment in segments(path) {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Some(map) = node.as_object_mut() else {
            return;
        };
        node = map.entry(segment.to_string()).or_insert(Value::Null);
    }
    *node = value;
}

fn detach(root: &mut Value, path: &str) -> Option<Value> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", path),
    };
    let mut node = root;
    for segment in segments(parent) {
        node = node.as_object_mut()?.get_mut(segment)?;
    }
    node.as_object_mut()?.remove(leaf)
}
