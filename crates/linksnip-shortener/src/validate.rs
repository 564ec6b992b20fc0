use jiff::Timestamp;
use linksnip_core::{ExpirationPolicy, ShortenerError};
use url::Url;

pub(crate) const MAX_URL_LENGTH: usize = 2048;

/// Checks that `url` is an absolute http(s) URL with a host and returns it
/// with surrounding whitespace removed.
pub(crate) fn target_url(url: &str) -> Result<&str, ShortenerError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ShortenerError::InvalidInput("URL is required".to_string()));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ShortenerError::InvalidInput(format!(
            "URL must be at most {} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed = Url::parse(url)
        .map_err(|e| ShortenerError::InvalidInput(format!("Invalid URL: {e}")))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::InvalidInput(format!(
            "URL scheme must be http or https, got '{scheme}'"
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ShortenerError::InvalidInput(
            "URL must have a host".to_string(),
        ));
    }

    Ok(url)
}

/// Converts an expiration policy into an absolute expiry, which must lie in
/// the future.
pub(crate) fn expiration(
    policy: &ExpirationPolicy,
    now: Timestamp,
) -> Result<Option<Timestamp>, ShortenerError> {
    let expires_at = match policy {
        ExpirationPolicy::Never => return Ok(None),
        ExpirationPolicy::AfterDuration(duration) => now
            .checked_add(*duration)
            .map_err(|e| ShortenerError::InvalidInput(format!("Invalid expiry duration: {e}")))?,
        ExpirationPolicy::AtTimestamp(timestamp) => *timestamp,
    };

    if expires_at <= now {
        return Err(ShortenerError::InvalidInput(
            "Expiry must be in the future".to_string(),
        ));
    }

    Ok(Some(expires_at))
}
