//! Link creation service.
//!
//! [`ShortenerService`] is the single entry point for creating links. It
//! validates input, honors custom codes, and retries generated codes on
//! collision. Core types are re-exported from `linksnip_core`.

pub mod service;
mod validate;

pub use linksnip_core::{ExpirationPolicy, ShortenParams, Shortener, ShortenerError};
pub use service::{ShortenerService, ShortenerSettings, DEFAULT_MAX_ATTEMPTS};
