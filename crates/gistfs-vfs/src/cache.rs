//! Content cache for opened files.
//!
//! Keeps the bytes of recently opened files keyed by node, with LRU
//! eviction. Entries are never invalidated: a node's remote descriptor is
//! immutable, so its content is assumed to be too.
//!
//! # Examples
//!
//! ```
//! use gistfs_vfs::{ContentCache, NodeId};
//! use std::sync::Arc;
//!
//! let cache = ContentCache::new(2);
//! cache.insert(NodeId::new(2), Arc::from(&b"hello"[..]));
//! assert_eq!(cache.get(NodeId::new(2)).as_deref(), Some(&b"hello"[..]));
//! ```

use crate::types::NodeId;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// LRU cache of file content.
///
/// A capacity of zero disables caching: `insert` is a no-op and `get`
/// always misses.
///
/// # Thread Safety
///
/// This type is `Send` and `Sync`; the LRU is guarded by a `Mutex` that is
/// only held for the duration of a single lookup or insert.
pub struct ContentCache {
    entries: Option<Mutex<LruCache<NodeId, Arc<[u8]>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits())
            .finish_non_exhaustive()
    }
}

impl ContentCache {
    /// Creates a cache holding at most `capacity` files.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns `false` when the cache was created with capacity zero.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Looks up the content of `node`, updating LRU order on hit.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<Arc<[u8]>> {
        let found = self.entries.as_ref().and_then(|entries| {
            let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.get(&node).cloned()
        });

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("content cache hit for {node}");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Stores the content of `node`, evicting the least recently used entry
    /// when full.
    pub fn insert(&self, node: NodeId, content: Arc<[u8]>) {
        if let Some(entries) = &self.entries {
            let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.put(node, content);
            tracing::debug!("content cached for {node} (cache size: {})", entries.len());
        }
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    /// Returns whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity (0 when disabled).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cap()
                .get()
        })
    }

    /// Number of lookups that found content.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that missed.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
