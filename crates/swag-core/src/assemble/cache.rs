use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use serde_json::Value;

/// Assembled documents keyed by document name.
#[derive(Debug, Default)]
pub struct DocumentCache {
    invalidate_on_every_call: bool,
    documents: RwLock<HashMap<String, Arc<Value>>>,
}

impl DocumentCache {
    pub fn new(invalidate_on_every_call: bool) -> Self {
        Self {
            invalidate_on_every_call,
            documents: RwLock::default(),
        }
    }

    /// The cached document, unless every call must rebuild.
    pub fn get(&self, name: &str) -> Option<Arc<Value>> {
        if self.invalidate_on_every_call {
            return None;
        }
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        let hit = documents.get(name).cloned();
        debug!(
            "document cache {} for {name}",
            if hit.is_some() { "hit" } else { "miss" }
        );
        hit
    }

    /// Replace the slot for `name` with a freshly assembled document.
    pub fn store(&self, name: &str, document: Value) -> Arc<Value> {
        let document = Arc::new(document);
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&document));
        document
    }

    pub fn clear(&self) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_documents_are_shared() {
        let cache = DocumentCache::new(false);
        let stored = cache.store("apispec_1", json!({"paths": {}}));
        let hit = cache.get("apispec_1").unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn invalidating_cache_never_hits() {
        let cache = DocumentCache::new(true);
        cache.store("apispec_1", json!({}));
        assert!(cache.get("apispec_1").is_none());
    }

    #[test]
    fn clear_drops_every_slot() {
        let cache = DocumentCache::new(false);
        cache.store("a", json!({}));
        cache.clear();
        assert!(cache.get("a").is_none());
    }
}
