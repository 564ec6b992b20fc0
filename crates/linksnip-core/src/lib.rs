//! Core types and traits for the LinkSnip URL shortener.
//!
//! This crate provides shared types and traits used by the shortener,
//! the redirector, the storage backends and the HTTP gateway.

pub mod cache;
pub mod error;
pub mod page;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::LinkCache;
pub use error::{CacheError, CoreError, ShortenerError, StorageError};
pub use page::{Page, PageRequest};
pub use repository::{LinkRecord, ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::{ExpirationPolicy, ShortenParams, Shortener};
