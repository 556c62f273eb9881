//! Shared key/value cache collaborator.
//!
//! The registry stores its code→id mapping and the locale list here. Values are
//! JSON so any backend (in-process map, Redis, memcached) can hold them. A miss
//! always means "reload from storage", never an error.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Minimal cache contract: get, put and forget by key.
pub trait SharedCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value);
    fn forget(&self, key: &str);
}

/// In-process cache backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

/// Process-wide cache instance (initialized lazily)
static GLOBAL_CACHE: OnceLock<MemoryCache> = OnceLock::new();

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide cache instance.
    pub fn global() -> &'static MemoryCache {
        GLOBAL_CACHE.get_or_init(MemoryCache::new)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn forget(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

impl SharedCache for &'static MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Value) {
        (**self).put(key, value)
    }

    fn forget(&self, key: &str) {
        (**self).forget(key)
    }
}
