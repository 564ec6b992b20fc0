pub mod random;

pub use random::RandomGenerator;

use linksnip_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A generated code is only a candidate: it may collide with an existing
/// record, and resolving the collision is the caller's job.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Generates a candidate short code. Never fails.
    fn generate(&self) -> Self::Output;
}
