//! Read-through caching for link stores.
//!
//! [`CachedRepository`] wraps any [`Repository`](linksnip_core::Repository)
//! with a [`LinkCache`] so that repeated lookups of a code, such as
//! `GET /api/links/{slug}`, skip the backing store. Clicks always reach the
//! store, since each one must be counted there.

pub mod moka;
pub mod repository;

pub use self::moka::{CacheConfig, MokaLinkCache};
pub use linksnip_core::cache::{LinkCache, Result};
pub use linksnip_core::CacheError;
pub use repository::CachedRepository;
