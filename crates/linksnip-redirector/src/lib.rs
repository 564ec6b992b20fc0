//! Short code resolution.
//!
//! [`RedirectorService`] turns a short code into its live [`LinkRecord`],
//! counting the click on the way. Lookup and count are one atomic store
//! operation, so every resolution reaches the store even behind a
//! `linksnip_cache::CachedRepository`; the decorator then evicts the code so
//! cached link details pick up the new count.
//!
//! ```rust
//! use linksnip_redirector::RedirectorService;
//! use linksnip_storage::InMemoryRepository;
//! use linksnip_core::ShortCode;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedirectorService::new(InMemoryRepository::new());
//!
//! let code = ShortCode::new("abc123")?;
//! if let Some(record) = service.resolve(&code).await? {
//!     println!("Redirect to: {}", record.target_url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`LinkRecord`]: linksnip_core::LinkRecord

pub mod error;
pub mod redirector;
pub mod service;

pub use error::{RedirectorError, Result};
pub use redirector::Redirector;
pub use service::RedirectorService;
