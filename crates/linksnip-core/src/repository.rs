use crate::error::StorageError;
use crate::page::{Page, PageRequest};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored link: the association between a short code and its target URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The short code, unique among live records.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub target_url: String,
    /// Whether the code was supplied by the caller rather than generated.
    pub is_custom: bool,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
    /// How many times the link has been resolved.
    pub click_count: u64,
}

impl LinkRecord {
    /// Returns `true` if the record has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

/// A read-only view of a link store.
///
/// Only live records are visible: expired records behave as if absent.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the live record for a given short code.
    /// Returns `None` if the code does not exist or has expired.
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Checks whether a live record exists for the short code.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Lists live records, newest first.
    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts the record unless a live record already holds its code.
    ///
    /// This is atomic per code: of several concurrent callers for the same
    /// code exactly one succeeds and the rest get [`StorageError::Conflict`].
    /// An expired record under the same code is replaced.
    async fn put_if_absent(&self, record: LinkRecord) -> Result<()>;

    /// Deletes the record for a given short code.
    /// Returns `true` if a record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Expires a live record immediately.
    /// Returns `true` if a live record was expired.
    async fn expire(&self, code: &ShortCode) -> Result<bool>;

    /// Atomically increments the click counter of a live record and returns
    /// the updated record, or `None` if no live record exists.
    async fn record_click(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;
}

#[async_trait]
impl<T: ReadRepository + ?Sized> ReadRepository for Arc<T> {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        (**self).get(code).await
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        (**self).exists(code).await
    }

    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>> {
        (**self).list(request).await
    }
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn put_if_absent(&self, record: LinkRecord) -> Result<()> {
        (**self).put_if_absent(record).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        (**self).delete(code).await
    }

    async fn expire(&self, code: &ShortCode) -> Result<bool> {
        (**self).expire(code).await
    }

    async fn record_click(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        (**self).record_click(code).await
    }
}
