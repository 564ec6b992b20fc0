use crate::error::{AppError, Result};
use crate::handlers::parse_slug;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;

/// Sends the client on to the link's target with a 307 and counts the click.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let code = parse_slug(slug)?;

    let record = state
        .redirector()
        .resolve(&code)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Redirect::temporary(&record.target_url))
}
