//! Process-wide memo of rendered markup.
//!
//! Entries are keyed by [`crate::options::cache_key`] and are never evicted: the store grows with
//! every distinct `(tex, options)` pair seen during the process lifetime. Hosts that need a bound
//! provide their own [`RenderStore`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::data_uri::DataUri;

/// Storage seam for rendered resources.
pub trait RenderStore: Send + Sync {
    fn lookup(&self, key: &str) -> Option<DataUri>;

    /// Insert or overwrite. Last writer wins.
    fn store(&self, key: String, resource: DataUri);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded string-keyed cache. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct RenderCache {
    entries: Arc<RwLock<HashMap<String, DataUri>>>,
}

static GLOBAL: OnceLock<RenderCache> = OnceLock::new();

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the cache shared by every adapter in this process.
    pub fn global() -> Self {
        GLOBAL.get_or_init(Self::new).clone()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl RenderStore for RenderCache {
    fn lookup(&self, key: &str) -> Option<DataUri> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn store(&self, key: String, resource: DataUri) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resource);
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
