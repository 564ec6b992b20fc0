use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use linksnip_core::{
    LinkCache, LinkRecord, Page, PageRequest, ReadRepository, Repository, ShortCode, StorageError,
};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Type alias for repository results.
pub type Result<T> = std::result::Result<T, StorageError>;

const GENERATION_STRIPES: usize = 64;

/// A repository decorator that adds read-through caching.
///
/// Reads check the cache first and fall back to the inner repository; a
/// present record read from the store is cached, an absent one is not.
/// Cached records that have expired since they were stored are dropped on
/// read.
///
/// Every write bumps a per-code generation and then evicts the code, both
/// under the same lock. A fill only lands if the generation it observed
/// before reading the store is still current, so a read that overlaps a
/// create, delete, expire or click can never leave its older view behind.
///
/// Clicks go straight to the inner repository and evict the code, so the
/// redirect path itself is not served from the cache. Listing bypasses the
/// cache.
#[derive(Debug, Clone)]
pub struct CachedRepository<R, C> {
    inner: R,
    cache: C,
    generations: Arc<[Mutex<u64>]>,
}

impl<R, C: LinkCache> CachedRepository<R, C> {
    /// Creates a new cached repository decorator.
    ///
    /// ```rust
    /// use linksnip_cache::{CachedRepository, MokaLinkCache};
    /// use linksnip_storage::InMemoryRepository;
    ///
    /// let cached_repo = CachedRepository::new(InMemoryRepository::new(), MokaLinkCache::new());
    /// ```
    pub fn new(inner: R, cache: C) -> Self {
        let generations: Vec<Mutex<u64>> = (0..GENERATION_STRIPES).map(|_| Mutex::new(0)).collect();
        Self {
            inner,
            cache,
            generations: generations.into(),
        }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn generation_of(&self, code: &ShortCode) -> &Mutex<u64> {
        let mut hasher = DefaultHasher::new();
        code.as_str().hash(&mut hasher);
        &self.generations[(hasher.finish() as usize) % self.generations.len()]
    }

    /// Marks `code` as written and evicts it. Call after the inner write.
    ///
    /// The write already happened, so a cache failure is logged rather than
    /// returned.
    pub async fn invalidate(&self, code: &ShortCode) {
        let mut generation = self.generation_of(code).lock().await;
        *generation = generation.wrapping_add(1);

        trace!(code = %code, "invalidating cache entry");
        if let Err(e) = self.cache.del(code).await {
            warn!(code = %code, error = %e, "failed to invalidate cache entry after write");
        }
    }

    /// Caches `record` unless `code` was written since `observed`.
    async fn fill(&self, code: &ShortCode, record: &LinkRecord, observed: u64) {
        let generation = self.generation_of(code).lock().await;
        if *generation != observed {
            debug!(code = %code, "write raced the read, not caching");
            return;
        }

        if let Err(e) = self.cache.set_link(code, record).await {
            warn!(code = %code, error = %e, "failed to cache record");
        }
    }
}

#[async_trait]
impl<R: ReadRepository, C: LinkCache> ReadRepository for CachedRepository<R, C> {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        match self.cache.get_link(code).await {
            Ok(Some(record)) if record.is_expired() => {
                debug!(code = %code, "cached record has expired");
                if let Err(e) = self.cache.del(code).await {
                    warn!(code = %code, error = %e, "failed to evict expired record");
                }
                return Ok(None);
            }
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => {}
            Err(e) => warn!(code = %code, error = %e, "cache lookup failed, reading store"),
        }

        let observed = *self.generation_of(code).lock().await;

        trace!(code = %code, "cache miss, fetching from inner repository");
        let record = self.inner.get(code).await?;

        if let Some(record) = &record {
            self.fill(code, record, observed).await;
        }
        Ok(record)
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.get(code).await?.is_some())
    }

    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>> {
        self.inner.list(request).await
    }
}

#[async_trait]
impl<R: Repository, C: LinkCache> Repository for CachedRepository<R, C> {
    async fn put_if_absent(&self, record: LinkRecord) -> Result<()> {
        let code = record.code.clone();
        let result = self.inner.put_if_absent(record).await;
        // a replaced expired record may still be cached
        self.invalidate(&code).await;
        result
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let deleted = self.inner.delete(code).await?;
        self.invalidate(code).await;
        Ok(deleted)
    }

    async fn expire(&self, code: &ShortCode) -> Result<bool> {
        let expired = self.inner.expire(code).await?;
        self.invalidate(code).await;
        Ok(expired)
    }

    async fn record_click(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        // Writing the returned count back would let an older click that
        // finishes last roll the cached count backwards.
        let updated = self.inner.record_click(code).await?;
        self.invalidate(code).await;
        Ok(updated)
    }
}
