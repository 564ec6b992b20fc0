use crate::error::{AppError, Result};
use crate::handlers::parse_slug;
use crate::model::{LinkListResponse, LinkResponse, ListQuery, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use linksnip_core::page::DEFAULT_PAGE_SIZE;
use linksnip_core::{ExpirationPolicy, PageRequest, ShortenParams};

pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = payload?;

    let mut params = ShortenParams::new(request.url.unwrap_or_default());
    if let Some(custom_slug) = request.custom_slug {
        params = params.with_custom_code(custom_slug);
    }
    if let Some(expires_at) = request.expires_at {
        params = params.with_expiration(ExpirationPolicy::AtTimestamp(expires_at));
    }

    let record = state.shortener().shorten(params).await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&record.code),
        slug: record.code.as_str().to_owned(),
    }))
}

pub async fn get_link_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>> {
    let code = parse_slug(slug)?;

    let record = state
        .shortener()
        .get(&code)
        .await?
        .ok_or(AppError::NotFound)?;

    let short_url = state.short_url(&record.code);
    Ok(Json(LinkResponse::from_record(record, short_url)))
}

pub async fn list_links_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<LinkListResponse>> {
    let Query(query) = query?;
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;

    let page = state
        .shortener()
        .list(request)
        .await?
        .map(|record| {
            let short_url = state.short_url(&record.code);
            LinkResponse::from_record(record, short_url)
        });

    Ok(Json(LinkListResponse {
        links: page.items,
        total: page.total,
        page: page.page,
        pages: page.pages,
    }))
}

pub async fn delete_link_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = parse_slug(slug)?;

    if state.shortener().delete(&code).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
