//! Link store backends.
//!
//! [`InMemoryRepository`] keeps records for the lifetime of the process and
//! is meant for tests and throwaway deployments. [`SqliteRepository`] is the
//! durable backend.

pub mod memory;
pub mod sqlite;

pub use linksnip_core::error::StorageError;
pub use linksnip_core::repository::{ReadRepository, Repository, Result};
pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;
