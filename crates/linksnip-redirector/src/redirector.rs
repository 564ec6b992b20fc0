use crate::Result;
use async_trait::async_trait;
use linksnip_core::{LinkRecord, ShortCode};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its live record and counts the click.
    /// Returns `None` if the code does not exist or has expired.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;
}
