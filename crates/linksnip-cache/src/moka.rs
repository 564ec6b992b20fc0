use async_trait::async_trait;
use linksnip_core::{LinkCache, LinkRecord, ShortCode};
use moka::future::Cache;
use std::time::Duration;
use tracing::trace;
use typed_builder::TypedBuilder;

/// Type alias for cache results.
pub type Result<T> = linksnip_core::cache::Result<T>;

pub const DEFAULT_CAPACITY: u64 = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Sizing and expiry for a [`MokaLinkCache`].
///
/// Entries always have a time-to-live, so anything the cache gets wrong is
/// bounded in time.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of records held.
    #[builder(default = DEFAULT_CAPACITY)]
    pub max_capacity: u64,
    /// Time-to-live, measured from insertion.
    #[builder(default = DEFAULT_TTL)]
    pub ttl: Duration,
    /// Optional time-to-idle, measured from the last read.
    #[builder(default)]
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// An in-process link cache backed by a moka future cache.
///
/// Only present records are stored; a lookup for an unknown code is never
/// cached, so creating that code needs no cleanup here.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    records: Cache<String, LinkRecord>,
}

impl MokaLinkCache {
    /// A cache with [`CacheConfig::default`].
    pub fn new() -> Self {
        Self::from(CacheConfig::default())
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CacheConfig> for MokaLinkCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl);

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        Self {
            records: builder.build(),
        }
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let record = self.records.get(code.as_str()).await;
        trace!(code = %code, hit = record.is_some(), "moka lookup");
        Ok(record)
    }

    async fn set_link(&self, code: &ShortCode, record: &LinkRecord) -> Result<()> {
        self.records
            .insert(code.as_str().to_owned(), record.clone())
            .await;
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.records.invalidate(code.as_str()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn record(c: &str) -> LinkRecord {
        LinkRecord {
            code: ShortCode::new_unchecked(c),
            target_url: format!("https://example.com/{c}"),
            is_custom: false,
            created_at: Timestamp::now(),
            expires_at: None,
            click_count: 0,
        }
    }

    #[tokio::test]
    async fn stores_and_removes_records() {
        let cache = MokaLinkCache::new();
        let rec = record("abc123");

        assert_eq!(cache.get_link(&rec.code).await.unwrap(), None);

        cache.set_link(&rec.code, &rec).await.unwrap();
        assert_eq!(cache.get_link(&rec.code).await.unwrap(), Some(rec.clone()));

        cache.del(&rec.code).await.unwrap();
        assert_eq!(cache.get_link(&rec.code).await.unwrap(), None);
        cache.del(&rec.code).await.unwrap();
    }

    #[test]
    fn default_config_has_bounded_ttl() {
        let config = CacheConfig::default();
        assert_eq!(config.max_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.tti, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MokaLinkCache::from(
            CacheConfig::builder()
                .max_capacity(16)
                .ttl(Duration::from_millis(50))
                .build(),
        );
        let rec = record("short-lived");

        cache.set_link(&rec.code, &rec).await.unwrap();
        assert!(cache.get_link(&rec.code).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get_link(&rec.code).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_idle_out_after_tti() {
        let cache = MokaLinkCache::from(
            CacheConfig::builder()
                .ttl(Duration::from_secs(60))
                .tti(Some(Duration::from_millis(50)))
                .build(),
        );
        let rec = record("idle");

        cache.set_link(&rec.code, &rec).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get_link(&rec.code).await.unwrap(), None);
    }
}
