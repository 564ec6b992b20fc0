use crate::validate;
use async_trait::async_trait;
use jiff::Timestamp;
use linksnip_core::{
    LinkRecord, Page, PageRequest, Repository, ShortCode, ShortenParams, Shortener,
    ShortenerError, StorageError,
};
use linksnip_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many generated codes to try before giving up. At least 1.
    #[builder(
        default = DEFAULT_MAX_ATTEMPTS,
        setter(transform = |attempts: usize| attempts.max(1))
    )]
    pub max_attempts: usize,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - URL and custom code validation
/// - Expiration policy conversion
/// - Short code allocation, retrying generated codes that collide
///
/// It holds no link state of its own; the repository's atomic
/// `put_if_absent` is what keeps codes unique.
#[derive(Debug, Clone)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: ShortenerSettings,
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with default settings.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ShortenerSettings::default())
    }

    pub fn with_settings(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            settings,
        }
    }

    fn new_record(
        code: ShortCode,
        target_url: &str,
        is_custom: bool,
        created_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> LinkRecord {
        LinkRecord {
            code,
            target_url: target_url.to_owned(),
            is_custom,
            created_at,
            expires_at,
            click_count: 0,
        }
    }

    async fn shorten_custom(
        &self,
        code: ShortCode,
        target_url: &str,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<LinkRecord, ShortenerError> {
        let record = Self::new_record(code, target_url, true, now, expires_at);

        match self.repository.put_if_absent(record.clone()).await {
            Ok(()) => {
                info!(code = %record.code, "created custom link");
                Ok(record)
            }
            Err(StorageError::Conflict(code)) => {
                debug!(code = %code, "custom code already taken");
                Err(ShortenerError::SlugConflict(code))
            }
            Err(e) => Err(storage_failure(&record.code, "put_if_absent", e)),
        }
    }

    async fn shorten_generated(
        &self,
        target_url: &str,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<LinkRecord, ShortenerError> {
        let max_attempts = self.settings.max_attempts;

        for attempt in 1..=max_attempts {
            let code: ShortCode = self.generator.generate().into();
            let record = Self::new_record(code, target_url, false, now, expires_at);

            match self.repository.put_if_absent(record.clone()).await {
                Ok(()) => {
                    info!(code = %record.code, attempt, "created link");
                    return Ok(record);
                }
                Err(StorageError::Conflict(code)) => {
                    warn!(code = %code, attempt, max_attempts, "generated code collided");
                }
                Err(e) => return Err(storage_failure(&record.code, "put_if_absent", e)),
            }
        }

        error!(attempts = max_attempts, "exhausted short code generation attempts");
        Err(ShortenerError::CapacityExhausted {
            attempts: max_attempts,
        })
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<LinkRecord, ShortenerError> {
        let target_url = validate::target_url(&params.target_url)?;

        let now = Timestamp::now();
        let expires_at = validate::expiration(&params.expiration, now)?;

        // An explicitly requested code never falls back to a generated one.
        match params.custom_code.filter(|code| !code.is_empty()) {
            Some(code) => {
                let code = ShortCode::new(code)?;
                self.shorten_custom(code, target_url, now, expires_at)
                    .await
            }
            None => self.shorten_generated(target_url, now, expires_at).await,
        }
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>, ShortenerError> {
        self.repository
            .get(code)
            .await
            .map_err(|e| storage_failure(code, "get", e))
    }

    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>, ShortenerError> {
        self.repository.list(request).await.map_err(|e| {
            error!(page = request.page(), limit = request.limit(), error = %e, "failed to list links");
            ShortenerError::Storage(e)
        })
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool, ShortenerError> {
        let deleted = self
            .repository
            .delete(code)
            .await
            .map_err(|e| storage_failure(code, "delete", e))?;

        if deleted {
            info!(code = %code, "deleted link");
        }
        Ok(deleted)
    }
}

/// Logs a storage failure with the code and operation involved and wraps it.
fn storage_failure(code: &ShortCode, operation: &'static str, e: StorageError) -> ShortenerError {
    error!(code = %code, operation, error = %e, "storage operation failed");
    ShortenerError::Storage(e)
}
