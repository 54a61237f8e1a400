//! Per-request correlation IDs.
//!
//! The ID lives in the request's typed context store (`http::Extensions`)
//! so every debug handler in one chain reports the same value.

use std::fmt;

use http::Extensions;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A fresh random (v4 UUID) identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed per-request key/value store with get-or-set semantics.
///
/// The type of the value is its key.
pub trait ContextStore {
    /// Return the stored `T`, or store and return `init()` if absent.
    /// An existing value is never overwritten.
    fn get_or_set<T, F>(&mut self, init: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T;
}

impl ContextStore for Extensions {
    fn get_or_set<T, F>(&mut self, init: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.get_or_insert_with(init).clone()
    }
}

/// Obtain the request's correlation ID, creating it on first use.
pub fn ensure<C: ContextStore>(store: &mut C) -> CorrelationId {
    store.get_or_set(CorrelationId::new)
}
