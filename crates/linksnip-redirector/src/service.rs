use std::sync::Arc;

use crate::redirector::Redirector;
use async_trait::async_trait;
use linksnip_core::{LinkRecord, Repository, ShortCode};
use tracing::{debug, error, trace};

/// Service for handling redirects.
///
/// Resolution goes through [`Repository::record_click`], so the lookup and
/// the click count are a single atomic step and expired records are never
/// resolved.
#[derive(Debug, Clone)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
}

impl<R: Repository> RedirectorService<R> {
    /// Creates a new RedirectorService with the given repository.
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Resolves a short code to its live record.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The record, with the click already counted
    /// * `Ok(None)` - If the code doesn't exist or has expired
    /// * `Err(e)` - If there was an error accessing the repository
    pub async fn resolve(&self, code: &ShortCode) -> crate::Result<Option<LinkRecord>> {
        Redirector::resolve(self, code).await
    }
}

#[async_trait]
impl<R: Repository> Redirector for RedirectorService<R> {
    async fn resolve(&self, code: &ShortCode) -> crate::Result<Option<LinkRecord>> {
        trace!(code = %code, "resolving short code");

        let resolved = self.repository.record_click(code).await.map_err(|e| {
            error!(code = %code, operation = "record_click", error = %e, "storage operation failed");
            crate::RedirectorError::from(e)
        })?;

        match &resolved {
            Some(record) => {
                debug!(
                    code = %code,
                    url = %record.target_url,
                    clicks = record.click_count,
                    "resolved short code"
                );
            }
            None => trace!(code = %code, "short code not found"),
        }

        Ok(resolved)
    }
}
