//! In-memory caching for frequently accessed data.
//! Uses moka for TTL-based caching.
//!
//! Only the public schema listing is cached. Review validation always reads
//! the schema inside its own transaction and never goes through here.

use crate::review_schema::ReviewFieldDefinition;
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache for the ordered schema listing served to review forms.
///
/// Registered as app data so every server instance (and every test app) owns
/// its own copy.
#[derive(Clone)]
pub struct SchemaCache {
    inner: Cache<(), Vec<ReviewFieldDefinition>>,
    /// Bumped by every invalidation
    generation: Arc<AtomicU64>,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).max_capacity(1).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builds a cache with the configured TTL.
    pub fn from_config() -> Self {
        Self::new(Duration::from_secs(
            crate::app_config::schema().cache_ttl_seconds,
        ))
    }

    /// Returns the cached listing, if any.
    pub fn get(&self) -> Option<Vec<ReviewFieldDefinition>> {
        self.inner.get(&())
    }

    /// Current generation. Read it before loading the listing from the
    /// database and hand it back to [`SchemaCache::store`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stores a listing read at `generation`. A listing read before the most
    /// recent invalidation is discarded.
    pub fn store(&self, generation: u64, fields: Vec<ReviewFieldDefinition>) {
        if self.generation() != generation {
            return;
        }
        self.inner.insert((), fields);
        // An invalidation may have landed between the check and the insert.
        if self.generation() != generation {
            self.inner.invalidate(&());
        }
    }

    /// Drops the cached listing. Call after every schema mutation.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(&());
    }
}
