use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use linksnip_core::error::StorageError;
use linksnip_core::page::{Page, PageRequest};
use linksnip_core::repository::{LinkRecord, ReadRepository, Repository, Result};
use linksnip_core::shortcode::ShortCode;
use tracing::trace;

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Per-code atomicity comes from the entry API,
/// which holds the shard's write lock across the check and the insert.
///
/// Expired records are dropped when they are read, deleted or listed.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, LinkRecord>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drops every record expired at `now`.
    fn purge_expired(&self, now: Timestamp) {
        let before = self.storage.len();
        self.storage.retain(|_, record| !record.is_expired_at(now));
        let purged = before.saturating_sub(self.storage.len());
        if purged > 0 {
            trace!(purged, "purged expired records");
        }
    }

    /// Drops `key` if it is still expired. Re-checks under the write lock so a
    /// record inserted after the caller's read is never removed.
    fn evict_expired(&self, key: &str) {
        self.storage.remove_if(key, |_, record| record.is_expired());
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let key = code.as_str();

        let Some(entry) = self.storage.get(key) else {
            return Ok(None);
        };

        if entry.is_expired() {
            drop(entry);
            self.evict_expired(key);
            return Ok(None);
        }

        Ok(Some(entry.clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.get(code).await?.is_some())
    }

    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>> {
        let now = Timestamp::now();
        self.purge_expired(now);

        let mut live: Vec<LinkRecord> = self
            .storage
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value().clone())
            .collect();

        live.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });

        let total = live.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = live
            .into_iter()
            .skip(offset)
            .take(request.limit() as usize)
            .collect();

        Ok(Page::new(items, total, request))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn put_if_absent(&self, record: LinkRecord) -> Result<()> {
        let key = record.code.as_str().to_owned();

        match self.storage.entry(key) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired() {
                    return Err(StorageError::Conflict(record.code.to_string()));
                }
                trace!(code = %record.code, "replacing expired record");
                occupied.insert(record);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
            }
        }

        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        // an expired record is dropped too, but did not count as present
        Ok(self
            .storage
            .remove(code.as_str())
            .is_some_and(|(_, record)| !record.is_expired()))
    }

    async fn expire(&self, code: &ShortCode) -> Result<bool> {
        let now = Timestamp::now();
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(false);
        };

        if entry.is_expired_at(now) {
            return Ok(false);
        }

        entry.expires_at = Some(now);
        Ok(true)
    }

    async fn record_click(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(None);
        };

        if entry.is_expired() {
            return Ok(None);
        }

        entry.click_count = entry.click_count.saturating_add(1);
        Ok(Some(entry.clone()))
    }
}
