use crate::error::CacheError;
use crate::repository::LinkRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A cache for link records.
///
/// This trait provides a domain-specific caching abstraction for
/// [`LinkRecord`]s, using [`ShortCode`] as the key.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get link record from cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Store link record in cache.
    async fn set_link(&self, code: &ShortCode, record: &LinkRecord) -> Result<()>;

    /// Remove link record from cache.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct TestCache {
        items: Mutex<HashMap<String, LinkRecord>>,
    }

    #[async_trait]
    impl LinkCache for TestCache {
        async fn get_link(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
            let items = self.items.lock().await;
            Ok(items.get(code.as_str()).cloned())
        }

        async fn set_link(&self, code: &ShortCode, record: &LinkRecord) -> Result<()> {
            let mut items = self.items.lock().await;
            items.insert(code.as_str().to_string(), record.clone());
            Ok(())
        }

        async fn del(&self, code: &ShortCode) -> Result<()> {
            let mut items = self.items.lock().await;
            items.remove(code.as_str());
            Ok(())
        }
    }

    fn test_record(code: &str, url: &str) -> LinkRecord {
        LinkRecord {
            code: ShortCode::new_unchecked(code),
            target_url: url.to_string(),
            is_custom: true,
            created_at: Timestamp::now(),
            expires_at: None,
            click_count: 0,
        }
    }

    #[tokio::test]
    async fn set_get_and_del() {
        let cache = TestCache::default();
        let code = ShortCode::new_unchecked("abc123");
        let record = test_record("abc123", "https://cached.example");

        assert_eq!(cache.get_link(&code).await.unwrap(), None);

        cache.set_link(&code, &record).await.unwrap();
        assert_eq!(cache.get_link(&code).await.unwrap(), Some(record));

        cache.del(&code).await.unwrap();
        assert_eq!(cache.get_link(&code).await.unwrap(), None);
        cache.del(&code).await.unwrap();
    }
}
