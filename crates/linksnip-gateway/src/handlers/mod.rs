mod health;
mod link;
mod redirect;

pub use health::health_handler;
pub use link::{delete_link_handler, get_link_handler, list_links_handler, shorten_handler};
pub use redirect::redirect_handler;

use linksnip_core::ShortCode;

/// Any path no route matches.
pub async fn not_found_handler() -> crate::AppError {
    crate::AppError::NotFound
}

/// Parses a path slug. A slug that could never have been stored is simply
/// not found.
fn parse_slug(slug: String) -> crate::Result<ShortCode> {
    ShortCode::new(slug).map_err(|_| crate::AppError::NotFound)
}
