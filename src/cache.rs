//! Reference-identity memoization of generated mocks.
//!
//! One cache per render invocation. The same shared service or module is
//! reachable through many paths of a dependency graph; every path must
//! resolve to literally the same mock instance or dependency-injection
//! identity breaks. Keys are pointer identities, never structural equality.

use std::collections::HashMap;
use std::sync::Arc;

use crate::framework::provider::{ModuleImport, ProviderEntry, Token};
use crate::framework::registry::TypeRef;

/// The role a reference was reached through. Part of the cache key: the same
/// class can be reachable both as a declaration (yielding a type mock) and as
/// a provider token (yielding a provider stub), and the two results must
/// occupy separate slots or one path evicts the other's entry mid-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Type,
    Provider,
    ImportList,
    ProviderList,
}

/// A reference identity usable as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(usize, KeyRole);

pub trait Identity {
    fn identity(&self) -> CacheKey;
}

impl Identity for TypeRef {
    fn identity(&self) -> CacheKey {
        CacheKey(self.addr(), KeyRole::Type)
    }
}

impl Identity for Token {
    fn identity(&self) -> CacheKey {
        CacheKey(self.addr(), KeyRole::Provider)
    }
}

impl Identity for Arc<Vec<ModuleImport>> {
    fn identity(&self) -> CacheKey {
        CacheKey(Arc::as_ptr(self) as usize, KeyRole::ImportList)
    }
}

impl Identity for Arc<Vec<ProviderEntry>> {
    fn identity(&self) -> CacheKey {
        CacheKey(Arc::as_ptr(self) as usize, KeyRole::ProviderList)
    }
}

/// Keyed store of generated mocks; at most one mock per original per cache.
#[derive(Default)]
pub struct MockCache<V: Clone> {
    entries: HashMap<CacheKey, V>,
}

impl<V: Clone> MockCache<V> {
    pub fn new() -> MockCache<V> {
        MockCache {
            entries: HashMap::new(),
        }
    }

    pub fn find(&self, key: CacheKey) -> Option<V> {
        self.entries.get(&key).cloned()
    }

    /// Stores `mock` under `key` and hands it back, so generation sites can
    /// cache and return in a single expression.
    pub fn add(&mut self, key: CacheKey, mock: V) -> V {
        self.entries.insert(key, mock.clone());
        mock
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
